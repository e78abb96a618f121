//! The build-request / parse-response capability pair.
//!
//! A descriptor knows how to build exactly one kind of request and how to
//! decode the payload that comes back. The client never looks inside: it
//! calls [`RequestMaker::build_request`], runs the request, and hands the
//! bytes to [`ResponseParser::parse`].

use std::fmt;
use std::marker::PhantomData;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::configuration::NetworkConfiguration;
use crate::decoding::DecodingConfiguration;
use crate::error::{DecodingError, RequestError};
use crate::types::{HttpRequest, Method};

/// Can build an outbound request.
///
/// Must be deterministic and perform no I/O.
pub trait RequestMaker {
    fn build_request(&self) -> Result<HttpRequest, RequestError>;
}

/// Can turn a response payload into a typed value.
pub trait ResponseParser {
    type Response: DeserializeOwned;

    fn parse(&self, body: &[u8]) -> Result<Self::Response, DecodingError>;
}

/// Both halves of a descriptor. Implemented for anything that is both a
/// [`RequestMaker`] and a [`ResponseParser`].
pub trait RequestDescriptor: RequestMaker + ResponseParser {}

impl<T: RequestMaker + ResponseParser> RequestDescriptor for T {}

/// A ready-made descriptor: one endpoint, one method, one response type.
///
/// # Example
///
/// ```ignore
/// let popular = Capsule::<_, Page<Title>>::get(CatalogEndpoint::popular(1))
///     .with_decoding(DecodingConfiguration::FRACTIONAL);
/// let page = client.execute(&popular).await?;
/// ```
pub struct Capsule<C, T> {
    configuration: C,
    method: Method,
    body: Option<Bytes>,
    decoding: DecodingConfiguration,
    tolerate_empty: bool,
    _response: PhantomData<fn() -> T>,
}

impl<C: NetworkConfiguration, T: DeserializeOwned> Capsule<C, T> {
    pub fn new(configuration: C, method: Method) -> Self {
        Self {
            configuration,
            method,
            body: None,
            decoding: DecodingConfiguration::STANDARD,
            tolerate_empty: false,
            _response: PhantomData,
        }
    }

    pub fn get(configuration: C) -> Self {
        Self::new(configuration, Method::GET)
    }

    pub fn post(configuration: C) -> Self {
        Self::new(configuration, Method::POST)
    }

    pub fn put(configuration: C) -> Self {
        Self::new(configuration, Method::PUT)
    }

    pub fn delete(configuration: C) -> Self {
        Self::new(configuration, Method::DELETE)
    }

    /// Attach a JSON body, encoded now so that building stays infallible
    /// with respect to the payload.
    pub fn with_json_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, RequestError> {
        self.body = Some(Bytes::from(serde_json::to_vec(body)?));
        Ok(self)
    }

    pub fn with_decoding(mut self, decoding: DecodingConfiguration) -> Self {
        self.decoding = decoding;
        self
    }

    /// Decode an empty payload as JSON `null` instead of failing.
    pub fn tolerate_empty_payload(mut self) -> Self {
        self.tolerate_empty = true;
        self
    }

    pub fn configuration(&self) -> &C {
        &self.configuration
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn decoding(&self) -> DecodingConfiguration {
        self.decoding
    }
}

impl<C: NetworkConfiguration, T: DeserializeOwned> RequestMaker for Capsule<C, T> {
    fn build_request(&self) -> Result<HttpRequest, RequestError> {
        let mut request = self.configuration.make_request(self.method)?;
        if let Some(body) = &self.body {
            request
                .headers
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
            request.body = Some(body.clone());
        }
        Ok(request)
    }
}

impl<C: NetworkConfiguration, T: DeserializeOwned> ResponseParser for Capsule<C, T> {
    type Response = T;

    fn parse(&self, body: &[u8]) -> Result<T, DecodingError> {
        if self.tolerate_empty {
            self.decoding.decode_or_null(body)
        } else {
            self.decoding.decode(body)
        }
    }
}

impl<C: fmt::Debug, T> fmt::Debug for Capsule<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capsule")
            .field("configuration", &self.configuration)
            .field("method", &self.method)
            .field("decoding", &self.decoding.name)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
