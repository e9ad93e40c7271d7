use crate::domain::{
    annotations::{DrawingToolSubsystem, ToolKind},
    chart::{ChartSurface, LogicalRange, SeriesPoint, TimeRange},
    logging::{LogComponent, get_logger},
    market_data::{IndicatorKind, IndicatorPoint, Symbol},
};
use gloo::utils::format::JsValueSerdeExt;
use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};

/// Calls `name` on a host object. Missing methods and thrown errors are
/// logged and read back as `None`.
fn call(target: &JsValue, name: &str, args: &[JsValue]) -> Option<JsValue> {
    let method = Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok());
    let Some(method) = method else {
        get_logger().warn(
            LogComponent::Presentation("JsAdapter"),
            &format!("host object has no method {}", name),
        );
        return None;
    };

    let args: Array = args.iter().collect();
    match method.apply(target, &args) {
        Ok(value) => Some(value),
        Err(error) => {
            get_logger().error(
                LogComponent::Presentation("JsAdapter"),
                &format!("{} threw: {:?}", name, error),
            );
            None
        }
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    JsValue::from_serde(value).unwrap_or(JsValue::NULL)
}

fn from_js<T: DeserializeOwned>(value: Option<JsValue>) -> Option<T> {
    value.filter(|v| !v.is_null() && !v.is_undefined()).and_then(|v| v.into_serde().ok())
}

/// [`ChartSurface`] backed by a JS chart object.
///
/// Calls run while the engine is mid-update; the host methods must not call
/// back into the engine synchronously.
pub struct JsChartSurface {
    target: JsValue,
}

impl JsChartSurface {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }
}

impl ChartSurface for JsChartSurface {
    fn set_data(&mut self, series: &[SeriesPoint]) {
        call(&self.target, "setData", &[to_js(series)]);
    }

    fn update(&mut self, point: SeriesPoint) {
        call(&self.target, "update", &[to_js(&point)]);
    }

    fn set_indicator(&mut self, kind: IndicatorKind, series: &[IndicatorPoint]) {
        call(&self.target, "setIndicator", &[JsValue::from_str(kind.as_ref()), to_js(series)]);
    }

    fn update_indicator(&mut self, kind: IndicatorKind, point: IndicatorPoint) {
        call(&self.target, "updateIndicator", &[JsValue::from_str(kind.as_ref()), to_js(&point)]);
    }

    fn clear_indicator(&mut self, kind: IndicatorKind) {
        call(&self.target, "clearIndicator", &[JsValue::from_str(kind.as_ref())]);
    }

    fn set_comparison(&mut self, symbol: &Symbol, color: &str, series: &[SeriesPoint]) {
        call(
            &self.target,
            "setComparison",
            &[JsValue::from_str(symbol.value()), JsValue::from_str(color), to_js(series)],
        );
    }

    fn remove_comparison(&mut self, symbol: &Symbol) {
        call(&self.target, "removeComparison", &[JsValue::from_str(symbol.value())]);
    }

    fn coordinate_to_time(&self, x: f64) -> Option<u64> {
        call(&self.target, "coordinateToTime", &[JsValue::from_f64(x)])
            .and_then(|v| v.as_f64())
            .filter(|t| t.is_finite() && *t >= 0.0)
            .map(|t| t as u64)
    }

    fn time_to_coordinate(&self, time: u64) -> Option<f64> {
        call(&self.target, "timeToCoordinate", &[JsValue::from_f64(time as f64)])
            .and_then(|v| v.as_f64())
    }

    fn visible_logical_range(&self) -> Option<LogicalRange> {
        from_js(call(&self.target, "getVisibleLogicalRange", &[]))
    }

    fn set_visible_logical_range(&mut self, range: LogicalRange) {
        call(&self.target, "setVisibleLogicalRange", &[to_js(&range)]);
    }

    fn visible_time_range(&self) -> Option<TimeRange> {
        from_js(call(&self.target, "getVisibleRange", &[]))
    }

    fn set_visible_time_range(&mut self, range: TimeRange) {
        call(&self.target, "setVisibleRange", &[to_js(&range)]);
    }

    fn width(&self) -> f64 {
        call(&self.target, "width", &[]).and_then(|v| v.as_f64()).unwrap_or(0.0)
    }

    fn set_loading(&mut self, loading: bool) {
        call(&self.target, "setLoading", &[JsValue::from_bool(loading)]);
    }
}

/// [`DrawingToolSubsystem`] backed by a JS drawing-tools object.
pub struct JsDrawingTools {
    target: JsValue,
}

impl JsDrawingTools {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }
}

impl DrawingToolSubsystem for JsDrawingTools {
    fn start_tool(&mut self, kind: ToolKind) {
        call(&self.target, "startTool", &[JsValue::from_str(kind.as_ref())]);
    }

    fn clear_tools(&mut self) {
        call(&self.target, "clearTools", &[]);
    }

    fn set_symbol(&mut self, symbol: &Symbol) {
        call(&self.target, "setSymbol", &[JsValue::from_str(symbol.value())]);
    }

    fn add_price_alert(&mut self, price: f64, condition: &str) {
        call(
            &self.target,
            "addPriceAlert",
            &[JsValue::from_f64(price), JsValue::from_str(condition)],
        );
    }

    fn remove_price_alert(&mut self, id: &str) {
        call(&self.target, "removePriceAlert", &[JsValue::from_str(id)]);
    }
}
