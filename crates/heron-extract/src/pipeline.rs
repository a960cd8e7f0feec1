//! The binding pipeline.
//!
//! An operation's declarations compile into an ordered list of [`Stage`]s
//! that run before the handler: parameter binders, the body binder, and
//! response layers that scope pending response descriptors. Each stage
//! either continues or terminates with a final response; the explicit
//! [`Outcome`] sum type carries that decision, so the sync and async
//! paths short-circuit identically with no unwinding involved.

use std::sync::Arc;

use bytes::Bytes;
use futures_core::future::BoxFuture;
use http::Response;
use serde_json::Value;

use heron_core::{
    Error, ParameterDefinition, PendingResponse, ProcessorRegistry, RequestBodyDefinition,
    RequestContext,
};

use crate::respond::{responseify, ResponseFilter};
use crate::{binder, body};

/// What a pipeline stage decided.
#[derive(Debug)]
pub enum Outcome {
    /// Binding succeeded; the next stage (or the handler) runs.
    Continue,
    /// A final response; the remaining stages and the handler are skipped.
    Terminate(Response<Bytes>),
}

/// One compiled pipeline stage.
pub(crate) enum Stage {
    Parameter(ParameterDefinition),
    Body(RequestBodyDefinition),
    ResponseLayer(Vec<PendingResponse>),
}

/// What a handler sees: the bound arguments and the means to serialize
/// its return value.
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    ctx: &'a RequestContext,
    processors: &'a ProcessorRegistry,
}

impl<'a> Invocation<'a> {
    pub(crate) fn new(ctx: &'a RequestContext, processors: &'a ProcessorRegistry) -> Self {
        Self { ctx, processors }
    }

    /// The request context.
    #[must_use]
    pub fn context(&self) -> &'a RequestContext {
        self.ctx
    }

    /// Looks up an argument bound by a parameter or body stage.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&'a Value> {
        self.ctx.arg(name)
    }

    /// Serializes `raw` through the single visible pending response
    /// descriptor.
    ///
    /// # Errors
    ///
    /// See [`responseify`].
    pub fn respond(&self, raw: Value) -> Result<Response<Bytes>, Error> {
        responseify(self.ctx, self.processors, raw, &ResponseFilter::new())
    }

    /// Serializes `raw` through the descriptor selected by `filter`.
    ///
    /// # Errors
    ///
    /// See [`responseify`].
    pub fn respond_with(
        &self,
        raw: Value,
        filter: &ResponseFilter,
    ) -> Result<Response<Bytes>, Error> {
        responseify(self.ctx, self.processors, raw, filter)
    }
}

/// A synchronous handler body.
pub type SyncHandlerFn =
    Arc<dyn Fn(Invocation<'_>) -> Result<Response<Bytes>, Error> + Send + Sync>;

/// An asynchronous handler body.
pub type AsyncHandlerFn = Arc<
    dyn for<'a> Fn(Invocation<'a>) -> BoxFuture<'a, Result<Response<Bytes>, Error>> + Send + Sync,
>;

/// A handler in either flavor.
#[derive(Clone)]
pub(crate) enum Handler {
    Sync(SyncHandlerFn),
    Async(AsyncHandlerFn),
}

/// Runs the pipeline synchronously.
///
/// An async handler cannot run here; reaching one is a declaration bug.
pub(crate) fn run_sync(
    stages: &[&Stage],
    ctx: &mut RequestContext,
    processors: &ProcessorRegistry,
    handler: &Handler,
) -> Result<Response<Bytes>, Error> {
    let Some((stage, rest)) = stages.split_first() else {
        return match handler {
            Handler::Sync(f) => f(Invocation::new(ctx, processors)),
            Handler::Async(_) => {
                tracing::warn!("async handler reached synchronous dispatch");
                Err(Error::AsyncHandlerInSyncDispatch)
            }
        };
    };

    match stage {
        Stage::Parameter(param) => match binder::bind_parameter(param, ctx) {
            Outcome::Continue => run_sync(rest, ctx, processors, handler),
            Outcome::Terminate(response) => Ok(response),
        },
        Stage::Body(definition) => match body::bind_body(definition, ctx, processors)? {
            Outcome::Continue => run_sync(rest, ctx, processors, handler),
            Outcome::Terminate(response) => Ok(response),
        },
        Stage::ResponseLayer(descriptors) => {
            let count = ctx.push_response_layer(descriptors.clone());
            let result = run_sync(rest, ctx, processors, handler);
            ctx.pop_response_layer(count);
            result
        }
    }
}

/// Runs the pipeline, awaiting the body processor and the handler.
///
/// Same semantics as [`run_sync`] stage for stage; sync handlers are
/// callable from here as well.
pub(crate) fn run_async<'a>(
    stages: &'a [&'a Stage],
    ctx: &'a mut RequestContext,
    processors: &'a ProcessorRegistry,
    handler: &'a Handler,
) -> BoxFuture<'a, Result<Response<Bytes>, Error>> {
    Box::pin(async move {
        let Some((stage, rest)) = stages.split_first() else {
            return match handler {
                Handler::Sync(f) => f(Invocation::new(ctx, processors)),
                Handler::Async(f) => f(Invocation::new(ctx, processors)).await,
            };
        };

        match stage {
            Stage::Parameter(param) => match binder::bind_parameter(param, ctx) {
                Outcome::Continue => run_async(rest, ctx, processors, handler).await,
                Outcome::Terminate(response) => Ok(response),
            },
            Stage::Body(definition) => {
                match body::bind_body_async(definition, ctx, processors).await? {
                    Outcome::Continue => run_async(rest, ctx, processors, handler).await,
                    Outcome::Terminate(response) => Ok(response),
                }
            }
            Stage::ResponseLayer(descriptors) => {
                let count = ctx.push_response_layer(descriptors.clone());
                let result = run_async(rest, ctx, processors, handler).await;
                ctx.pop_response_layer(count);
                result
            }
        }
    })
}
