//! Shared test helpers: a recording host runtime and a scripted bridge.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use solvapay_mcp::config::{HostConfig, PLUGIN_ID};
use solvapay_mcp::error::{BridgeError, Result};
use solvapay_mcp::mcp::{BridgeOptions, JsonObject, RemoteTool, ToolBridge};
use solvapay_mcp::plugin::{
    register_with, McpService, PluginApi, PluginLogger, PluginService,
};
use solvapay_mcp::tools::{HostTool, ToolOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// A host runtime that records everything the plugin does.
pub struct MockApi {
    config: HostConfig,
    env: HashMap<String, String>,
    logs: Mutex<Vec<(Level, String)>>,
    tools: Mutex<Vec<(HostTool, ToolOptions)>>,
    services: Mutex<Vec<Arc<dyn PluginService>>>,
}

impl MockApi {
    /// Host whose `plugins.entries.solvapay.config` is `config`.
    pub fn new(config: serde_json::Value) -> Self {
        Self::from_host_config(HostConfig::with_plugin(PLUGIN_ID, config))
    }

    /// Host with an API key in plugin config, like a typical install.
    pub fn with_key() -> Self {
        Self::new(serde_json::json!({ "apiKey": "sk_sandbox_test_key" }))
    }

    pub fn from_host_config(config: HostConfig) -> Self {
        Self {
            config,
            env: HashMap::new(),
            logs: Mutex::new(Vec::new()),
            tools: Mutex::new(Vec::new()),
            services: Mutex::new(Vec::new()),
        }
    }

    pub fn env_var(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn lines(&self, level: Level) -> Vec<String> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn logged(&self, level: Level, needle: &str) -> bool {
        self.lines(level).iter().any(|line| line.contains(needle))
    }

    pub fn tools(&self) -> Vec<(HostTool, ToolOptions)> {
        self.tools.lock().unwrap().clone()
    }

    pub fn services(&self) -> Vec<Arc<dyn PluginService>> {
        self.services.lock().unwrap().clone()
    }

    fn log(&self, level: Level, message: &str) {
        self.logs.lock().unwrap().push((level, message.to_string()));
    }
}

impl PluginLogger for MockApi {
    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

impl PluginApi for MockApi {
    fn config(&self) -> &HostConfig {
        &self.config
    }

    fn logger(&self) -> &dyn PluginLogger {
        self
    }

    fn env(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    fn register_tool(&self, tool: HostTool, options: ToolOptions) {
        self.tools.lock().unwrap().push((tool, options));
    }

    fn register_service(&self, service: Arc<dyn PluginService>) {
        self.services.lock().unwrap().push(service);
    }
}

/// A bridge whose outcomes are scripted per test.
#[derive(Default)]
pub struct MockBridge {
    pub options: Mutex<Option<BridgeOptions>>,
    connect_error: Mutex<Option<BridgeError>>,
    list_result: Mutex<Option<Result<Vec<RemoteTool>>>>,
    call_results: Mutex<VecDeque<Result<String>>>,
    close_error: Mutex<Option<BridgeError>>,
    pub calls: Mutex<Vec<(String, JsonObject)>>,
    connects: AtomicUsize,
    lists: AtomicUsize,
    closes: AtomicUsize,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools(self, tools: Vec<RemoteTool>) -> Self {
        *self.list_result.lock().unwrap() = Some(Ok(tools));
        self
    }

    pub fn failing_connect(self, error: BridgeError) -> Self {
        *self.connect_error.lock().unwrap() = Some(error);
        self
    }

    pub fn failing_list(self, error: BridgeError) -> Self {
        *self.list_result.lock().unwrap() = Some(Err(error));
        self
    }

    pub fn failing_close(self, error: BridgeError) -> Self {
        *self.close_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_call_result(self, result: Result<String>) -> Self {
        self.call_results.lock().unwrap().push_back(result);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn recorded_options(&self) -> Option<BridgeOptions> {
        self.options.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolBridge for MockBridge {
    async fn connect(&self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.connect_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn list_tools(&self) -> Result<Vec<RemoteTool>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.list_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        self.call_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match self.close_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Run plugin registration with `bridge` standing in for the real one.
pub fn register_mock(api: &Arc<MockApi>, bridge: &Arc<MockBridge>) -> Option<Arc<McpService>> {
    let bridge = Arc::clone(bridge);
    register_with(api.clone(), move |options| {
        *bridge.options.lock().unwrap() = Some(options);
        bridge as Arc<dyn ToolBridge>
    })
}

/// Register and return the single service the plugin handed to the host.
pub fn registered_service(api: &Arc<MockApi>, bridge: &Arc<MockBridge>) -> Arc<dyn PluginService> {
    register_mock(api, bridge).expect("registration should succeed");
    let services = api.services();
    assert_eq!(services.len(), 1);
    Arc::clone(&services[0])
}

pub fn tool(name: &str, description: Option<&str>, schema: serde_json::Value) -> RemoteTool {
    RemoteTool::new(name, description.map(str::to_string), schema)
}
