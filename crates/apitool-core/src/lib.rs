//! apitool Core Library
//!
//! This library converts the operations of an OpenAPI 3.0/3.1 document into
//! OpenAI function-calling definitions or MCP tool definitions.
//!
//! The pipeline runs in four stages: [`openapi::Document`] loading and
//! validation, operation extraction, schema translation ([`translate`]) and
//! envelope rendering ([`emit`]). [`Converter`] drives all of them.

pub mod config;
pub mod convert;
pub mod emit;
pub mod error;
pub mod naming;
pub mod openapi;
pub mod schema;
pub mod translate;

pub use crate::{
    config::{ConverterConfig, TargetFormat},
    convert::{ConversionReport, Converter, OperationFailure},
    emit::Descriptor,
    error::{Error, ErrorKind, Result},
    openapi::{Document, SpecSource},
};
