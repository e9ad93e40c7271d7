use crate::domain::{
    annotations::{
        AlertSummary, AlertTriggered, DEFAULT_ALERT_CONDITION, DrawingToolSubsystem, ToolKind,
        ToolRequest,
    },
    errors::{ApplicationError, ValidationError},
    events::EngineEvent,
    logging::LogComponent,
    market_data::{Price, Symbol},
};
use crate::{log_debug, log_info};

/// Narrow boundary to the drawing-tool subsystem.
///
/// Outbound calls are forwarded as-is. Inbound notifications are decoded into
/// [`EngineEvent`]s for the coordinator to publish; no trigger logic lives here.
pub struct AnnotationBridge {
    tools: Box<dyn DrawingToolSubsystem>,
    active_tool: ToolKind,
    alerts: Vec<AlertSummary>,
}

impl AnnotationBridge {
    pub fn new(tools: Box<dyn DrawingToolSubsystem>) -> Self {
        Self { tools, active_tool: ToolKind::None, alerts: Vec::new() }
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    /// Last alert list reported by the subsystem.
    pub fn alerts(&self) -> &[AlertSummary] {
        &self.alerts
    }

    pub fn start_tool(&mut self, request: ToolRequest) -> ToolKind {
        let kind = ToolKind::from(request);
        log_debug!(LogComponent::Application("AnnotationBridge"), "start tool {}", kind);
        self.tools.start_tool(kind);
        self.active_tool = kind;
        kind
    }

    pub fn start_tool_by_name(&mut self, name: &str) -> Result<ToolKind, ValidationError> {
        let request = name
            .parse::<ToolRequest>()
            .map_err(|_| ValidationError::UnknownTool(name.to_string()))?;
        Ok(self.start_tool(request))
    }

    pub fn cancel_tool(&mut self) {
        self.tools.start_tool(ToolKind::None);
        self.active_tool = ToolKind::None;
    }

    pub fn clear_all(&mut self) {
        log_info!(LogComponent::Application("AnnotationBridge"), "clearing all drawings");
        self.tools.clear_tools();
        self.active_tool = ToolKind::None;
    }

    pub fn set_symbol(&mut self, symbol: &Symbol) {
        self.tools.set_symbol(symbol);
    }

    /// The subsystem finished placing a drawing and dropped back to the cursor.
    pub fn tool_finished(&mut self) -> EngineEvent {
        self.active_tool = ToolKind::None;
        EngineEvent::ToolFinished
    }

    pub fn alert_triggered(&mut self, event: AlertTriggered) -> EngineEvent {
        log_info!(
            LogComponent::Application("AnnotationBridge"),
            "alert {} triggered at {}",
            event.id,
            event.price
        );
        EngineEvent::AlertTriggered(event)
    }

    pub fn alert_list_changed(&mut self, alerts: Vec<AlertSummary>) -> EngineEvent {
        self.alerts = alerts.clone();
        EngineEvent::AlertListChanged(alerts)
    }

    /// Places a crossing alert at `current`, the store's latest close.
    pub fn create_alert_at_current_price(
        &mut self,
        current: Option<Price>,
    ) -> Result<f64, ApplicationError> {
        let price = current.map(|p| p.value()).filter(|p| p.is_finite());
        let price = price.ok_or(ApplicationError::NoPriceData)?;
        self.tools.add_price_alert(price, DEFAULT_ALERT_CONDITION);
        Ok(price)
    }

    pub fn add_price_alert(
        &mut self,
        price: f64,
        condition: Option<&str>,
    ) -> Result<(), ValidationError> {
        if !price.is_finite() {
            return Err(ValidationError::InvalidPrice(format!("{} is not a finite price", price)));
        }
        self.tools.add_price_alert(price, condition.unwrap_or(DEFAULT_ALERT_CONDITION));
        Ok(())
    }

    /// Ids are opaque to the engine; empty ones are ignored.
    pub fn remove_price_alert(&mut self, id: &str) {
        if !id.is_empty() {
            self.tools.remove_price_alert(id);
        }
    }
}
