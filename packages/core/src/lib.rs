//! # capsule-core
//!
//! I/O-free building blocks for typed HTTP calls.
//!
//! A *descriptor* pairs "can build a request" with "can parse a response
//! into `T`". Descriptors are plain values: they are built per call, hold no
//! connection state, and are never retried internally. Executing them is the
//! job of `capsule-http`.
//!
//! ## Describing an endpoint
//!
//! ```ignore
//! use capsule_core::{Capsule, DecodingConfiguration, NetworkConfiguration, QueryItem};
//!
//! struct Popular { base: Url, page: u32 }
//!
//! impl NetworkConfiguration for Popular {
//!     fn base_url(&self) -> &Url { &self.base }
//!     fn path(&self) -> &str { "movie/popular" }
//!     fn query_items(&self) -> Vec<QueryItem> {
//!         vec![QueryItem::new("page", self.page.to_string())]
//!     }
//! }
//!
//! let descriptor = Capsule::<_, Page<Title>>::get(Popular { base, page: 1 })
//!     .with_decoding(DecodingConfiguration::FRACTIONAL);
//! ```
//!
//! ## Decoding
//!
//! Two presets ship with the crate, both converting `snake_case` keys:
//!
//! - [`DecodingConfiguration::STANDARD`]: `2024-05-01T12:30:45Z`
//! - [`DecodingConfiguration::FRACTIONAL`]: `2024-05-01T12:30:45.123Z`
//!
//! Date fields use [`Timestamp`] so they follow whichever preset decodes them.

pub mod configuration;
pub mod decoding;
pub mod descriptor;
pub mod error;
pub mod types;

pub use configuration::NetworkConfiguration;
pub use decoding::{DateDecodingStrategy, DecodingConfiguration, KeyDecodingStrategy, Timestamp};
pub use descriptor::{Capsule, RequestDescriptor, RequestMaker, ResponseParser};
pub use error::{DecodingError, RequestError};
pub use types::{CachePolicy, HttpRequest, HttpResponse, Method, QueryItem};
