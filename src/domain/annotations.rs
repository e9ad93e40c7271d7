//! Contract with the external drawing-tool and price-alert subsystem.
//!
//! The subsystem keeps its own drawings, undo history and alert trigger logic.
//! This side only names tools, forwards requests and decodes the events it
//! emits.

use crate::domain::market_data::Symbol;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

/// Tools understood by the drawing subsystem.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, StrumDisplay, AsRefStr, EnumIter, Serialize,
)]
pub enum ToolKind {
    /// Plain cursor; no tool armed.
    #[default]
    None,
    TrendLine,
    Arrow,
    Ray,
    ExtendedLine,
    HorizontalLine,
    HorizontalRay,
    VerticalLine,
    CrossLine,
    ParallelChannel,
    FibRetracement,
    FibExtension,
    Pitchfork,
    Brush,
    Highlighter,
    Rectangle,
    Circle,
    Path,
    Text,
    Callout,
    PriceLabel,
    Pattern,
    Triangle,
    Abcd,
    Xabcd,
    ElliottImpulseWave,
    ElliottCorrectionWave,
    HeadAndShoulders,
    LongPosition,
    ShortPosition,
    DateRange,
    PriceRange,
    DatePriceRange,
    Measure,
}

/// Tool identifiers as the host toolbar names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ToolRequest {
    Cursor,
    #[strum(serialize = "trendline")]
    TrendLine,
    Arrow,
    Ray,
    ExtendedLine,
    Horizontal,
    HorizontalRay,
    Vertical,
    CrossLine,
    ParallelChannel,
    Fibonacci,
    FibExtension,
    Pitchfork,
    Brush,
    Highlighter,
    Rectangle,
    Circle,
    Path,
    Text,
    Callout,
    PriceLabel,
    Pattern,
    Triangle,
    Abcd,
    Xabcd,
    ElliottImpulse,
    ElliottCorrection,
    HeadAndShoulders,
    Prediction,
    PredictionShort,
    DateRange,
    PriceRange,
    DatePriceRange,
    Measure,
    Remove,
}

impl From<ToolRequest> for ToolKind {
    fn from(request: ToolRequest) -> Self {
        match request {
            ToolRequest::Cursor | ToolRequest::Remove => ToolKind::None,
            ToolRequest::TrendLine => ToolKind::TrendLine,
            ToolRequest::Arrow => ToolKind::Arrow,
            ToolRequest::Ray => ToolKind::Ray,
            ToolRequest::ExtendedLine => ToolKind::ExtendedLine,
            ToolRequest::Horizontal => ToolKind::HorizontalLine,
            ToolRequest::HorizontalRay => ToolKind::HorizontalRay,
            ToolRequest::Vertical => ToolKind::VerticalLine,
            ToolRequest::CrossLine => ToolKind::CrossLine,
            ToolRequest::ParallelChannel => ToolKind::ParallelChannel,
            ToolRequest::Fibonacci => ToolKind::FibRetracement,
            ToolRequest::FibExtension => ToolKind::FibExtension,
            ToolRequest::Pitchfork => ToolKind::Pitchfork,
            ToolRequest::Brush => ToolKind::Brush,
            ToolRequest::Highlighter => ToolKind::Highlighter,
            ToolRequest::Rectangle => ToolKind::Rectangle,
            ToolRequest::Circle => ToolKind::Circle,
            ToolRequest::Path => ToolKind::Path,
            ToolRequest::Text => ToolKind::Text,
            ToolRequest::Callout => ToolKind::Callout,
            ToolRequest::PriceLabel => ToolKind::PriceLabel,
            ToolRequest::Pattern => ToolKind::Pattern,
            ToolRequest::Triangle => ToolKind::Triangle,
            ToolRequest::Abcd => ToolKind::Abcd,
            ToolRequest::Xabcd => ToolKind::Xabcd,
            ToolRequest::ElliottImpulse => ToolKind::ElliottImpulseWave,
            ToolRequest::ElliottCorrection => ToolKind::ElliottCorrectionWave,
            ToolRequest::HeadAndShoulders => ToolKind::HeadAndShoulders,
            ToolRequest::Prediction => ToolKind::LongPosition,
            ToolRequest::PredictionShort => ToolKind::ShortPosition,
            ToolRequest::DateRange => ToolKind::DateRange,
            ToolRequest::PriceRange => ToolKind::PriceRange,
            ToolRequest::DatePriceRange => ToolKind::DatePriceRange,
            ToolRequest::Measure => ToolKind::Measure,
        }
    }
}

pub const DEFAULT_ALERT_CONDITION: &str = "crossing";
pub const DEFAULT_ALERT_KIND: &str = "price";

/// Alert identifiers arrive as strings or numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AlertId {
    Text(String),
    Number(serde_json::Number),
}

impl From<AlertId> for String {
    fn from(id: AlertId) -> Self {
        match id {
            AlertId::Text(text) => text,
            AlertId::Number(number) => number.to_string(),
        }
    }
}

/// Trigger event as emitted by the subsystem, before normalization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAlertTriggered {
    pub external_id: Option<AlertId>,
    pub alert_id: Option<AlertId>,
    pub id: Option<AlertId>,
    pub price: Option<f64>,
    pub alert_price: Option<f64>,
    pub timestamp: Option<u64>,
    pub direction: Option<String>,
    pub condition: Option<String>,
}

/// A price alert fired inside the drawing subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAlertTriggered")]
pub struct AlertTriggered {
    pub id: String,
    pub price: f64,
    pub timestamp: Option<u64>,
    pub direction: Option<String>,
    pub condition: String,
}

impl TryFrom<RawAlertTriggered> for AlertTriggered {
    type Error = String;

    fn try_from(raw: RawAlertTriggered) -> Result<Self, Self::Error> {
        let id = raw
            .external_id
            .or(raw.alert_id)
            .or(raw.id)
            .map(String::from)
            .ok_or_else(|| "alert event without id".to_string())?;
        let price = raw
            .price
            .or(raw.alert_price)
            .filter(|p| p.is_finite())
            .ok_or_else(|| format!("alert {} has no finite price", id))?;
        Ok(Self {
            id,
            price,
            timestamp: raw.timestamp,
            direction: raw.direction,
            condition: raw.condition.unwrap_or_else(|| DEFAULT_ALERT_CONDITION.to_string()),
        })
    }
}

fn default_condition() -> String {
    DEFAULT_ALERT_CONDITION.to_string()
}

fn default_kind() -> String {
    DEFAULT_ALERT_KIND.to_string()
}

/// Entry of the subsystem's current alert list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub id: String,
    pub price: f64,
    #[serde(default = "default_condition")]
    pub condition: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
}

/// The drawing-tool and alert subsystem as seen from the engine.
pub trait DrawingToolSubsystem {
    fn start_tool(&mut self, kind: ToolKind);

    /// Removes every drawing.
    fn clear_tools(&mut self);

    fn set_symbol(&mut self, symbol: &Symbol);

    fn add_price_alert(&mut self, price: f64, condition: &str);

    fn remove_price_alert(&mut self, id: &str);
}
