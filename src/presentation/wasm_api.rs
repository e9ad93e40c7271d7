use super::js_adapters::{JsChartSurface, JsDrawingTools};
use crate::application::{
    coordinator::{ChartCoordinator, ComparisonOutcome, LoadOutcome, update_and_notify},
    use_cases::{ChartDataFeed, PlaybackDriver},
};
use crate::config::EngineConfig;
use crate::domain::{
    annotations::{AlertSummary, AlertTriggered},
    chart::ChartType,
    errors::AppError,
    logging::{LogComponent, get_logger},
    market_data::{IndicatorSettings, Symbol, TimeInterval},
    replay::SeekIndicator,
};
use crate::infrastructure::{
    http::BinanceHistoricalSource, timers::GlooIntervalScheduler,
    websocket::BinanceTickSource,
};
use crate::time_utils;
use gloo::utils::format::JsValueSerdeExt;
use js_sys::{Function, Promise};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

fn js_error(error: impl Into<AppError>) -> JsValue {
    JsValue::from_str(&error.into().to_string())
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

fn indicator_js(indicator: SeekIndicator) -> JsValue {
    let value = json!({ "visible": indicator.visible, "fade": indicator.fade, "x": indicator.x });
    JsValue::from_serde(&value).unwrap_or(JsValue::NULL)
}

/// JavaScript entry point. Thin bridge: every method forwards to the
/// coordinator and keeps the playback timer in sync afterwards.
#[wasm_bindgen]
pub struct ReplayEngineApi {
    coordinator: Rc<RefCell<ChartCoordinator>>,
    feed: Rc<ChartDataFeed<BinanceHistoricalSource, BinanceTickSource>>,
    playback: PlaybackDriver<GlooIntervalScheduler>,
}

#[wasm_bindgen]
impl ReplayEngineApi {
    /// `surface` and `tools` are host objects; `config` is optional JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(
        surface: JsValue,
        tools: JsValue,
        config: Option<String>,
    ) -> Result<ReplayEngineApi, JsValue> {
        let config = match config {
            Some(json) => EngineConfig::from_json(&json).map_err(js_error)?,
            None => EngineConfig::default(),
        };
        crate::install_services(config.log_level);
        let coordinator = Rc::new(RefCell::new(ChartCoordinator::new(
            config,
            Box::new(JsChartSurface::new(surface)),
            Box::new(JsDrawingTools::new(tools)),
        )));
        let feed = Rc::new(ChartDataFeed::new(
            Rc::clone(&coordinator),
            BinanceHistoricalSource::new(),
            BinanceTickSource::new(),
        ));
        let playback = PlaybackDriver::new(Rc::clone(&coordinator), GlooIntervalScheduler);

        get_logger().info(LogComponent::Presentation("ReplayEngineApi"), "engine created");
        Ok(Self { coordinator, feed, playback })
    }

    /// Resolves to `loaded`, `empty`, `failed`, `stale` or `cancelled`.
    #[wasm_bindgen(js_name = switchSymbol)]
    pub fn switch_symbol(&self, symbol: String, interval: String) -> Promise {
        self.playback.stop();
        let feed = Rc::clone(&self.feed);
        future_to_promise(async move {
            let symbol = Symbol::new(&symbol).map_err(js_error)?;
            let interval = interval.parse::<TimeInterval>().map_err(js_error)?;
            let outcome = match feed.switch_to(symbol, interval).await {
                LoadOutcome::Loaded(_) => "loaded",
                LoadOutcome::Empty => "empty",
                LoadOutcome::Failed => "failed",
                LoadOutcome::Stale => "stale",
                LoadOutcome::Cancelled => "cancelled",
            };
            Ok(JsValue::from_str(outcome))
        })
    }

    /// Adds or removes a comparison overlay. Resolves to `loaded`, `removed`,
    /// `unavailable`, `failed`, `stale` or `cancelled`.
    #[wasm_bindgen(js_name = toggleComparison)]
    pub fn toggle_comparison(&self, symbol: String) -> Promise {
        let feed = Rc::clone(&self.feed);
        future_to_promise(async move {
            let symbol = Symbol::new(&symbol).map_err(js_error)?;
            let outcome = match feed.toggle_comparison(symbol).await {
                ComparisonOutcome::Loaded(_) => "loaded",
                ComparisonOutcome::Removed => "removed",
                ComparisonOutcome::Unavailable => "unavailable",
                ComparisonOutcome::Failed => "failed",
                ComparisonOutcome::Stale => "stale",
                ComparisonOutcome::Cancelled => "cancelled",
            };
            Ok(JsValue::from_str(outcome))
        })
    }

    /// `handler` receives `{ type, payload }` objects. Handlers run after the
    /// call that raised the event has returned, so they may call back in.
    pub fn subscribe(&self, handler: Function) {
        self.coordinator.borrow().subscribe(move |event| {
            let value = JsValue::from_serde(event).unwrap_or(JsValue::NULL);
            if let Err(error) = handler.call1(&JsValue::NULL, &value) {
                get_logger().warn(
                    LogComponent::Presentation("ReplayEngineApi"),
                    &format!("event handler threw: {:?}", error),
                );
            }
        });
    }

    #[wasm_bindgen(js_name = replayState)]
    pub fn replay_state(&self) -> JsValue {
        JsValue::from_serde(self.coordinator.borrow().replay_state()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = toggleReplay)]
    pub fn toggle_replay(&self) -> Result<String, JsValue> {
        let mode = self.update(|c| c.toggle_replay()).map_err(js_error)?;
        self.playback.sync();
        Ok(mode.to_string())
    }

    pub fn play(&self) -> Result<(), JsValue> {
        self.update(|c| c.play()).map_err(js_error)?;
        self.playback.sync();
        Ok(())
    }

    pub fn pause(&self) {
        self.update(|c| c.pause());
        self.playback.sync();
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) -> Result<String, JsValue> {
        let mode = self.update(|c| c.toggle_play()).map_err(js_error)?;
        self.playback.sync();
        Ok(mode.to_string())
    }

    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed(&self, multiplier: f64) -> Result<f64, JsValue> {
        let speed = self.update(|c| c.set_speed(multiplier)).map_err(js_error)?;
        self.playback.sync();
        Ok(speed)
    }

    #[wasm_bindgen(js_name = stepForward)]
    pub fn step_forward(&self) -> Result<Option<usize>, JsValue> {
        let index = self.update(|c| c.step_forward()).map_err(js_error)?;
        self.playback.sync();
        Ok(index)
    }

    #[wasm_bindgen(js_name = requestJump)]
    pub fn request_jump(&self) -> Result<(), JsValue> {
        self.update(|c| c.request_jump()).map_err(js_error)?;
        self.playback.sync();
        Ok(())
    }

    #[wasm_bindgen(js_name = pointerEnter)]
    pub fn pointer_enter(&self, x: f64) -> JsValue {
        indicator_js(self.update(|c| c.pointer_entered(x)))
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, x: f64) -> JsValue {
        indicator_js(self.update(|c| c.pointer_moved(x, now_ms())))
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&self) -> JsValue {
        indicator_js(self.update(|c| c.pointer_left()))
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, x: f64) {
        self.update(|c| c.pointer_pressed(x, now_ms()));
    }

    pub fn click(&self, x: f64) -> Result<Option<usize>, JsValue> {
        let index = self.update(|c| c.clicked(x, now_ms())).map_err(js_error)?;
        self.playback.sync();
        Ok(index)
    }

    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&self) -> bool {
        self.update(|c| c.drag_started())
    }

    #[wasm_bindgen(js_name = dragMove)]
    pub fn drag_move(&self, x: f64) -> Option<usize> {
        let index = self.update(|c| c.dragged(x, now_ms()));
        self.playback.sync();
        index
    }

    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&self, x: f64) -> Option<usize> {
        let index = self.update(|c| c.drag_released(x));
        self.playback.sync();
        index
    }

    #[wasm_bindgen(js_name = seekIndicator)]
    pub fn seek_indicator(&self) -> JsValue {
        indicator_js(self.coordinator.borrow().seek_indicator())
    }

    #[wasm_bindgen(js_name = setChartType)]
    pub fn set_chart_type(&self, name: &str) -> Result<(), JsValue> {
        let chart_type = name
            .parse::<ChartType>()
            .map_err(|_| JsValue::from_str(&format!("Unknown chart type: {}", name)))?;
        self.update(|c| c.set_chart_type(chart_type));
        Ok(())
    }

    #[wasm_bindgen(js_name = setIndicators)]
    pub fn set_indicators(&self, sma: bool, ema: bool) {
        self.update(|c| c.set_indicator_settings(IndicatorSettings { sma, ema }));
    }

    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&self) {
        self.update(|c| c.reset_view());
    }

    pub fn countdown(&self) -> Option<String> {
        self.coordinator.borrow().countdown(time_utils::now_secs())
    }

    #[wasm_bindgen(js_name = startTool)]
    pub fn start_tool(&self, name: &str) -> Result<String, JsValue> {
        let kind = self.update(|c| c.start_tool(name)).map_err(js_error)?;
        Ok(kind.as_ref().to_string())
    }

    #[wasm_bindgen(js_name = cancelTool)]
    pub fn cancel_tool(&self) {
        self.update(|c| c.cancel_tool());
    }

    #[wasm_bindgen(js_name = clearDrawings)]
    pub fn clear_drawings(&self) {
        self.update(|c| c.clear_drawings());
    }

    #[wasm_bindgen(js_name = onToolFinished)]
    pub fn on_tool_finished(&self) {
        self.update(|c| c.on_tool_finished());
    }

    /// Alert payloads arrive as JSON text from the drawing subsystem.
    #[wasm_bindgen(js_name = onAlertTriggered)]
    pub fn on_alert_triggered(&self, json: &str) -> Result<(), JsValue> {
        let alert: AlertTriggered = serde_json::from_str(json)
            .map_err(|e| JsValue::from_str(&format!("Invalid alert event: {}", e)))?;
        self.update(|c| c.on_alert_triggered(alert));
        Ok(())
    }

    #[wasm_bindgen(js_name = onAlertListChanged)]
    pub fn on_alert_list_changed(&self, json: &str) -> Result<(), JsValue> {
        let alerts: Vec<AlertSummary> = serde_json::from_str(json)
            .map_err(|e| JsValue::from_str(&format!("Invalid alert list: {}", e)))?;
        self.update(|c| c.on_alert_list_changed(alerts));
        Ok(())
    }

    #[wasm_bindgen(js_name = createAlertAtCurrentPrice)]
    pub fn create_alert_at_current_price(&self) -> Result<f64, JsValue> {
        self.update(|c| c.create_alert_at_current_price()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = addPriceAlert)]
    pub fn add_price_alert(&self, price: f64, condition: Option<String>) -> Result<(), JsValue> {
        self.update(|c| c.add_price_alert(price, condition.as_deref())).map_err(js_error)
    }

    #[wasm_bindgen(js_name = removePriceAlert)]
    pub fn remove_price_alert(&self, id: &str) {
        self.update(|c| c.remove_price_alert(id));
    }

    /// Stops streams and the playback timer. The instance stays usable for a
    /// later `switchSymbol`.
    pub fn shutdown(&self) {
        self.playback.stop();
        self.feed.shutdown();
    }
}

impl ReplayEngineApi {
    fn update<R>(&self, action: impl FnOnce(&mut ChartCoordinator) -> R) -> R {
        update_and_notify(&self.coordinator, action)
    }
}
