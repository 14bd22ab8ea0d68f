//! Chart generation and rendering for the dashboard.
//!
//! The category breakdown is shown two ways: an ECharts bar chart generated
//! with charming, and a proportional bar list with the palette colors from
//! the aggregation. Both are driven by the same [CategoryShare] values.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::bar,
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::aggregation::CategoryShare,
    html::{HeadElement, format_currency},
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML container for a dashboard chart.
pub(super) fn chart_container(chart: &DashboardChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="min-h-[320px] rounded dark:bg-gray-100"
        {}
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with dark mode support
/// and responsive resizing.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// Builds the bar chart of category totals for the selected month and kind.
pub(super) fn category_chart(breakdown: &[CategoryShare], title: &str) -> Chart {
    let labels: Vec<String> = breakdown.iter().map(|share| share.name.clone()).collect();
    let values: Vec<f64> = breakdown.iter().map(|share| share.value).collect();

    Chart::new()
        .title(Title::new().text(title).subtext("Selected month"))
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(bar::Bar::new().name(title.to_owned()).data(values))
}

/// Renders the proportional bar list of the category breakdown.
pub(super) fn breakdown_list_view(breakdown: &[CategoryShare]) -> Markup {
    html! {
        div class="space-y-3 w-full"
        {
            @for share in breakdown {
                div class="space-y-1"
                {
                    div class="flex justify-between text-sm"
                    {
                        span class="font-medium" { (share.name) }
                        span class="text-gray-500 dark:text-gray-400"
                        {
                            (format_currency(share.value)) " (" (share.percent) "%)"
                        }
                    }

                    div class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-2.5"
                    {
                        div
                            class="h-2.5 rounded-full"
                            style=(format!(
                                "width: {}%; background-color: {};",
                                share.percent, share.color
                            ))
                        {}
                    }
                }
            }
        }
    }
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
