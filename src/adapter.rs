//! Adapting record-typed functions to untyped map-in/map-out form.
//!
//! `Handler` is implemented for plain functions and closures of arity 0 to 2
//! so that `adapt` can read the declared parameter types and reject any
//! signature other than a single record-typed parameter before the first call.

use std::fmt;

use serde_json::{Map, Value as Json};

use crate::classify::{classify, Kind};
use crate::codec;
use crate::declare::Record;
use crate::error::{AdaptError, ConfigError, ConfigReason, ConstructError};
use crate::ir::{RecordType, Ty};
use crate::value::{FromVal, Typed, Val};

pub type JsonMap = Map<String, Json>;

pub trait Handler<Args>: Send + Sync + 'static {
    type Output: Record;

    /// Declared parameter types, in order.
    fn params() -> Vec<Ty>;

    fn invoke(&self, args: Vec<Val>) -> Result<Self::Output, ConstructError>;
}

impl<F, O> Handler<()> for F
where
    F: Fn() -> O + Send + Sync + 'static,
    O: Record,
{
    type Output = O;

    fn params() -> Vec<Ty> {
        Vec::new()
    }

    fn invoke(&self, _args: Vec<Val>) -> Result<O, ConstructError> {
        Ok(self())
    }
}

impl<F, A, O> Handler<(A,)> for F
where
    F: Fn(A) -> O + Send + Sync + 'static,
    A: Typed + FromVal,
    O: Record,
{
    type Output = O;

    fn params() -> Vec<Ty> {
        vec![A::ty()]
    }

    fn invoke(&self, args: Vec<Val>) -> Result<O, ConstructError> {
        let mut args = args.into_iter();
        let a = A::from_val(args.next().unwrap_or(Val::Null)).map_err(|e| e.in_field("#0"))?;
        Ok(self(a))
    }
}

impl<F, A, B, O> Handler<(A, B)> for F
where
    F: Fn(A, B) -> O + Send + Sync + 'static,
    A: Typed + FromVal,
    B: Typed + FromVal,
    O: Record,
{
    type Output = O;

    fn params() -> Vec<Ty> {
        vec![A::ty(), B::ty()]
    }

    fn invoke(&self, args: Vec<Val>) -> Result<O, ConstructError> {
        let mut args = args.into_iter();
        let a = A::from_val(args.next().unwrap_or(Val::Null)).map_err(|e| e.in_field("#0"))?;
        let b = B::from_val(args.next().unwrap_or(Val::Null)).map_err(|e| e.in_field("#1"))?;
        Ok(self(a, b))
    }
}

type CallFn = Box<dyn Fn(&JsonMap) -> Result<JsonMap, AdaptError> + Send + Sync>;

/// A function wrapped to take and return untyped JSON maps.
pub struct Adapter {
    input: &'static RecordType,
    output: &'static RecordType,
    call: CallFn,
}

/// Wrap `handler`, checking its signature now rather than on first call.
pub fn adapt<Args, H>(handler: H) -> Result<Adapter, ConfigError>
where
    Args: 'static,
    H: Handler<Args>,
{
    let input = record_parameter(&H::params())?;
    let output = <H::Output as Record>::record_type();
    tracing::debug!(input = %input.name, output = %output.name, "adapted function");

    let call: CallFn = Box::new(move |map| {
        let value = codec::decode(input, map)?;
        let result = handler.invoke(vec![Val::Record(value)])?;
        Ok(codec::record_to_plain_map(&result)?)
    });
    Ok(Adapter { input, output, call })
}

fn record_parameter(params: &[Ty]) -> Result<&'static RecordType, ConfigError> {
    match params {
        [] => Err(ConfigError {
            param: "<none>".to_string(),
            declared: "()".to_string(),
            reason: ConfigReason::WrongArity { found: 0 },
        }),
        [only] => match classify(only) {
            Kind::Record(rt) => Ok(rt),
            _ => Err(ConfigError {
                param: "#0".to_string(),
                declared: only.to_string(),
                reason: ConfigReason::NotARecord,
            }),
        },
        [_, extra, ..] => Err(ConfigError {
            param: "#1".to_string(),
            declared: extra.to_string(),
            reason: ConfigReason::WrongArity { found: params.len() },
        }),
    }
}

impl Adapter {
    pub fn call(&self, input: &JsonMap) -> Result<JsonMap, AdaptError> {
        tracing::trace!(input = %self.input.name, "adapted call");
        (self.call)(input)
    }

    pub fn input_type(&self) -> &'static RecordType {
        self.input
    }

    pub fn output_type(&self) -> &'static RecordType {
        self.output
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("input", &self.input.name)
            .field("output", &self.output.name)
            .finish()
    }
}
