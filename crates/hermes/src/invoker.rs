//! The invocation flow: load, match, synthesize, invoke, normalize.

use std::path::{Path, PathBuf};

use hermes_config::HermesConfig;
use hermes_core::{
    invoke_handler, snapshot_env, ApiGatewayEvent, EnvMode, HandlerRegistry, InvocationContext,
    NormalizedResponse,
};
use hermes_manifest::{
    find_service_path, find_service_path_from_cwd, LoadOptions, Service, VariableSources,
    DEFAULT_MANIFEST_NAMES,
};
use hermes_router::{RequestLine, RouteTable, RouterError};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info_span, Instrument};

use crate::error::{InvokeError, InvokeResult};

/// A service loaded once per invoker.
#[derive(Debug)]
struct LoadedService {
    service: Service,
    routes: RouteTable,
}

/// Invokes a service's handlers from `"METHOD path?query"` request lines.
///
/// The manifest is read lazily on the first invocation and cached for the
/// lifetime of the invoker.
///
/// # Example
///
/// ```no_run
/// use hermes::{HandlerRegistry, HandlerResponse, Invoker};
/// use serde_json::json;
///
/// # async fn run() -> Result<(), hermes::InvokeError> {
/// let mut registry = HandlerRegistry::new();
/// registry.direct("handler.hello", |event, _ctx| async move {
///     Ok(HandlerResponse::ok().json(&json!({ "input": event }))?)
/// });
///
/// let invoker = Invoker::discover(registry)?;
/// let response = invoker.invoke("GET api/hello").await?;
/// assert_eq!(response.status_code, 200);
/// assert_eq!(response.body["input"]["path"], "/api/hello");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Invoker {
    registry: HandlerRegistry,
    service_path: PathBuf,
    load_options: LoadOptions,
    read_process_env: bool,
    env_mode: EnvMode,
    loaded: OnceCell<LoadedService>,
}

impl Invoker {
    /// Creates an invoker for the service in `service_path`.
    ///
    /// Nothing is read until the first invocation. `${env:...}` variables
    /// resolve against the process environment as it is at that point,
    /// outside any invocation's scope.
    #[must_use]
    pub fn new(service_path: impl Into<PathBuf>, registry: HandlerRegistry) -> Self {
        Self {
            registry,
            service_path: service_path.into(),
            load_options: LoadOptions {
                manifest_names: DEFAULT_MANIFEST_NAMES.iter().map(ToString::to_string).collect(),
                sources: VariableSources::new(),
            },
            read_process_env: true,
            env_mode: EnvMode::default(),
            loaded: OnceCell::new(),
        }
    }

    /// Finds the service by walking up from the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Manifest`] when no manifest is found.
    pub fn discover(registry: HandlerRegistry) -> InvokeResult<Self> {
        let service_path = find_service_path_from_cwd(&DEFAULT_MANIFEST_NAMES)?;
        Ok(Self::new(service_path, registry))
    }

    /// Finds the service by walking up from `start`.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Manifest`] when no manifest is found.
    pub fn discover_from(start: impl AsRef<Path>, registry: HandlerRegistry) -> InvokeResult<Self> {
        let service_path = find_service_path(start.as_ref(), &DEFAULT_MANIFEST_NAMES)?;
        Ok(Self::new(service_path, registry))
    }

    /// Creates an invoker from harness configuration.
    ///
    /// Uses `service.path` when set, otherwise discovers the service from
    /// the working directory with the configured manifest names. The
    /// configured stage and region feed `${opt:...}` variables.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Config`] when the configuration is invalid and
    /// [`InvokeError::Manifest`] when discovery fails.
    pub fn from_config(config: &HermesConfig, registry: HandlerRegistry) -> InvokeResult<Self> {
        config.validate()?;

        let names = &config.service.manifest_names;
        let service_path = match &config.service.path {
            Some(path) => path.clone(),
            None => find_service_path_from_cwd(names)?,
        };

        let mut sources = VariableSources::new();
        if let Some(stage) = &config.service.stage {
            sources = sources.with_option("stage", stage);
        }
        if let Some(region) = &config.service.region {
            sources = sources.with_option("region", region);
        }

        let env_mode = if config.invocation.apply_process_env {
            EnvMode::Process
        } else {
            EnvMode::ContextOnly
        };

        let mut invoker = Self::new(service_path, registry).with_env_mode(env_mode);
        invoker.load_options = LoadOptions {
            manifest_names: names.clone(),
            sources,
        };
        Ok(invoker)
    }

    /// Replaces the manifest load options.
    ///
    /// The given sources are used as they are: the process environment is
    /// no longer read for `${env:...}` variables.
    #[must_use]
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self.read_process_env = false;
        self
    }

    /// Sets where the declared environment is made visible.
    #[must_use]
    pub fn with_env_mode(mut self, env_mode: EnvMode) -> Self {
        self.env_mode = env_mode;
        self
    }

    /// The service directory.
    #[must_use]
    pub fn service_path(&self) -> &Path {
        &self.service_path
    }

    /// The registered handlers.
    #[must_use]
    pub const fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// The loaded service, reading the manifest on first use.
    pub async fn service(&self) -> InvokeResult<&Service> {
        Ok(&self.loaded().await?.service)
    }

    /// The compiled route table, reading the manifest on first use.
    pub async fn routes(&self) -> InvokeResult<&RouteTable> {
        Ok(&self.loaded().await?.routes)
    }

    /// Invokes the handler matching `request_line` with an empty event and
    /// context.
    pub async fn invoke(&self, request_line: &str) -> InvokeResult<NormalizedResponse> {
        self.invoke_with(request_line, Value::Null, Value::Null).await
    }

    /// Invokes the handler matching `request_line`.
    ///
    /// `event` and `context` must each be a JSON object or `null`. The
    /// event's fields reach the handler alongside the computed request
    /// fields, which always take precedence.
    ///
    /// # Errors
    ///
    /// Setup failures are returned as errors: a missing manifest, a
    /// malformed request line, no matching route, an unregistered handler,
    /// non-object overrides, or a JSON-declared body that does not parse.
    /// A failing handler is not an error; it yields a `502` response.
    pub async fn invoke_with(
        &self,
        request_line: &str,
        event: Value,
        context: Value,
    ) -> InvokeResult<NormalizedResponse> {
        let span = info_span!("invoke", request = %request_line.trim());
        self.run(request_line, event, context).instrument(span).await
    }

    /// Starts a request builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn run(invoker: &hermes::Invoker) -> Result<(), hermes::InvokeError> {
    /// let response = invoker
    ///     .request("POST api/postit")
    ///     .header("Content-Type", "text/plain")
    ///     .body("boo")
    ///     .send()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn request(&self, request_line: impl Into<String>) -> InvokeRequest<'_> {
        InvokeRequest::new(self, request_line.into())
    }

    async fn run(
        &self,
        request_line: &str,
        event: Value,
        context: Value,
    ) -> InvokeResult<NormalizedResponse> {
        let loaded = self.loaded().await?;

        let request = RequestLine::parse(request_line)?;
        let line = request_line.trim();
        let matched = loaded.routes.match_request(line).map_err(|err| match err {
            RouterError::RouteNotFound { request } => {
                InvokeError::route_not_found(request, &self.service_path)
            }
            other => other.into(),
        })?;

        let template = &matched.route.template;
        let handler = self.registry.get(&template.handler_ref).ok_or_else(|| {
            InvokeError::HandlerNotRegistered {
                handler: template.handler_ref.to_string(),
                function: template.function_name.clone(),
            }
        })?;

        let event = ApiGatewayEvent::synthesize(&matched, &request, event)?;
        let ctx = InvocationContext::new(&template.function_name, template.handler_ref.clone())
            .with_environment(loaded.service.environment_for(&template.function_name))
            .with_client_context(context)?;

        debug!(
            request_id = %ctx.request_id(),
            function = %template.function_name,
            handler = %template.handler_ref,
            style = ?handler.style(),
            "invoking handler"
        );

        invoke_handler(handler, event, ctx, self.env_mode)
            .await
            .map_err(InvokeError::from)
    }

    async fn loaded(&self) -> InvokeResult<&LoadedService> {
        self.loaded
            .get_or_try_init(|| async {
                let mut options = self.load_options.clone();
                if self.read_process_env {
                    options.sources = options.sources.with_env_defaults(snapshot_env().await);
                }
                let service = Service::load(&self.service_path, &options)?;
                let routes = RouteTable::compile(service.routes())?;
                Ok::<_, InvokeError>(LoadedService { service, routes })
            })
            .await
    }
}

/// A request under construction, sent with [`InvokeRequest::send`].
#[derive(Debug)]
#[must_use]
pub struct InvokeRequest<'a> {
    invoker: &'a Invoker,
    request_line: String,
    event: Value,
    context: Value,
    error: Option<InvokeError>,
}

impl<'a> InvokeRequest<'a> {
    fn new(invoker: &'a Invoker, request_line: String) -> Self {
        Self {
            invoker,
            request_line,
            event: Value::Null,
            context: Value::Null,
            error: None,
        }
    }

    /// Replaces the event overrides.
    pub fn event(mut self, event: Value) -> Self {
        self.event = event;
        self
    }

    /// Replaces the client context.
    pub fn context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Sets one event field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Some(event) = self.event_object() {
            event.insert(name.into(), value.into());
        }
        self
    }

    /// Sets `event.body`.
    pub fn body(self, body: impl Into<String>) -> Self {
        self.field("body", body.into())
    }

    /// Sets `event.body` to the JSON text of `value` and declares its
    /// content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => self.header("Content-Type", "application/json").body(body),
            Err(err) => {
                self.error = Some(InvokeError::RequestBody(err));
                self
            }
        }
    }

    /// Sets one entry of `event.headers`.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(event) = self.event_object() {
            let headers = event
                .entry("headers")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(headers) = headers {
                headers.insert(name.into(), Value::String(value.into()));
            }
        }
        self
    }

    /// Sends the request.
    ///
    /// # Errors
    ///
    /// See [`Invoker::invoke_with`].
    pub async fn send(self) -> InvokeResult<NormalizedResponse> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.invoker
            .invoke_with(&self.request_line, self.event, self.context)
            .await
    }

    // A non-object event is left alone so that `send` reports it.
    fn event_object(&mut self) -> Option<&mut Map<String, Value>> {
        if self.event.is_null() {
            self.event = Value::Object(Map::new());
        }
        self.event.as_object_mut()
    }
}
