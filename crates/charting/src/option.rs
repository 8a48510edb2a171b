//! Chart option handed to the charting collaborator. Field names follow the
//! collaborator's option schema (camelCase).

use serde::Serialize;

pub const X_AXIS_TITLE: &str = "PC 1";
pub const Y_AXIS_TITLE: &str = "PC 2";
pub const MARKER_OPACITY: f64 = 0.8;
pub const MARKER_SYMBOL: &str = "emptyCircle";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOption {
    pub tooltip: TooltipOption,
    pub legend: LegendOption,
    pub x_axis: AxisOption,
    pub y_axis: AxisOption,
    pub series: Vec<ScatterSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipOption {
    pub trigger: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendOption {
    pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisOption {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub split_line: SplitLine,
}

impl AxisOption {
    pub fn value(name: &'static str) -> Self {
        Self {
            kind: "value",
            name,
            split_line: SplitLine { show: false },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitLine {
    pub show: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterSeries {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub symbol: &'static str,
    pub item_style: ItemStyle,
    pub data: Vec<ScatterDatum>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ItemStyle {
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterDatum {
    pub value: [f64; 2],
    pub name: String,
    pub tooltip: DatumTooltip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatumTooltip {
    pub formatter: String,
}
