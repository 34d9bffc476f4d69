//! Typed query parameters and their binding to template placeholders

use buildstructor::{buildstructor, Builder};
use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{template::Bindings, QueryError};

/// Turns a parameter record into the named values its template expects
pub trait QueryParams {
    /// Every placeholder value for this record
    fn bindings(&self) -> Bindings;
}

/// Time bucket size of a query window
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    Day,
    Hour,
    #[default]
    Minute,
    Second,
}

impl Step {
    /// The `chrono` pattern the backend expects for window bounds at this step
    pub const fn time_format(self) -> &'static str {
        match self {
            Step::Day => "%Y-%m-%d",
            Step::Hour => "%Y-%m-%d %H",
            Step::Minute => "%Y-%m-%d %H%M",
            Step::Second => "%Y-%m-%d %H%M%S",
        }
    }

    /// Renders `instant` as a window bound at this step
    pub fn format(self, instant: DateTime<Utc>) -> String {
        instant.format(self.time_format()).to_string()
    }
}

/// Which traces to list
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceState {
    #[default]
    All,
    Success,
    Error,
}

/// How traces are ordered
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryOrder {
    ByStartTime,
    #[default]
    ByDuration,
}

/// A `[start, end]` window, bounds already rendered for `step`
#[derive(Clone, Debug, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct QueryDuration {
    start: String,
    end: String,
    step: Step,
}

impl QueryDuration {
    /// A window from pre-rendered bounds
    pub fn new(start: impl Into<String>, end: impl Into<String>, step: Step) -> QueryDuration {
        QueryDuration {
            start: start.into(),
            end: end.into(),
            step,
        }
    }

    /// A window between two instants, rendered for `step`
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>, step: Step) -> QueryDuration {
        QueryDuration::new(step.format(start), step.format(end), step)
    }

    /// The `window` leading up to `now`. The window must be positive and must not reach past
    /// the earliest representable instant.
    pub fn ending_at(
        now: DateTime<Utc>,
        window: TimeDelta,
        step: Step,
    ) -> Result<QueryDuration, QueryError> {
        if window <= TimeDelta::zero() {
            return Err(QueryError::Config {
                msg: format!("query window must be positive, got {window}"),
            });
        }
        let start = now
            .checked_sub_signed(window)
            .ok_or_else(|| QueryError::Config {
                msg: format!("query window {window} reaches past the earliest representable time"),
            })?;
        Ok(QueryDuration::between(start, now, step))
    }

    /// The last `window` leading up to the current time
    pub fn last(window: TimeDelta, step: Step) -> Result<QueryDuration, QueryError> {
        QueryDuration::ending_at(Utc::now(), window, step)
    }

    /// The last `minutes` minutes leading up to the current time
    pub fn last_minutes(minutes: i64, step: Step) -> Result<QueryDuration, QueryError> {
        let window = TimeDelta::try_minutes(minutes).ok_or_else(|| QueryError::Config {
            msg: format!("{minutes} minutes is not a representable query window"),
        })?;
        QueryDuration::last(window, step)
    }

    fn bind_into(&self, bindings: &mut Bindings) {
        bindings.insert("start", &self.start);
        bindings.insert("end", &self.end);
        bindings.insert("step", self.step);
    }
}

impl Default for QueryDuration {
    /// The last fifteen minutes at minute granularity
    fn default() -> Self {
        let now = Utc::now();
        QueryDuration::between(now - TimeDelta::minutes(15), now, Step::Minute)
    }
}

/// Parameters of a trace listing
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct TracesQuery {
    duration: QueryDuration,
    trace_state: TraceState,
    page_num: u32,
    page_size: u32,
    need_total: bool,
    query_order: QueryOrder,
}

#[buildstructor]
impl TracesQuery {
    /// Page 1 of 15 traces in any state, slowest first, unless told otherwise
    #[builder]
    pub fn new(
        duration: QueryDuration,
        trace_state: Option<TraceState>,
        page_num: Option<u32>,
        page_size: Option<u32>,
        need_total: Option<bool>,
        query_order: Option<QueryOrder>,
    ) -> TracesQuery {
        TracesQuery {
            duration,
            trace_state: trace_state.unwrap_or_default(),
            page_num: page_num.unwrap_or(1),
            page_size: page_size.unwrap_or(15),
            need_total: need_total.unwrap_or(true),
            query_order: query_order.unwrap_or_default(),
        }
    }
}

impl QueryParams for TracesQuery {
    fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        self.duration.bind_into(&mut bindings);
        bindings.insert("traceState", self.trace_state);
        bindings.insert("pageNum", self.page_num);
        bindings.insert("pageSize", self.page_size);
        bindings.insert("needTotal", self.need_total);
        bindings.insert("queryOrder", self.query_order);
        bindings
    }
}

/// Parameters of the service listing
#[derive(Builder, Clone, Debug, PartialEq, Eq, Getters)]
pub struct ServicesQuery {
    duration: QueryDuration,
}

impl QueryParams for ServicesQuery {
    fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        self.duration.bind_into(&mut bindings);
        bindings
    }
}

/// Parameters of the instance listing of one service
#[derive(Builder, Clone, Debug, PartialEq, Eq, Getters)]
pub struct InstancesQuery {
    service_id: String,
    duration: QueryDuration,
}

impl QueryParams for InstancesQuery {
    fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new().bind("serviceId", &self.service_id);
        self.duration.bind_into(&mut bindings);
        bindings
    }
}

/// Parameters of the endpoint listing of one service
#[derive(Builder, Clone, Debug, PartialEq, Eq, Getters)]
pub struct EndpointQuery {
    service_id: String,
}

impl QueryParams for EndpointQuery {
    fn bindings(&self) -> Bindings {
        Bindings::new().bind("serviceId", &self.service_id)
    }
}

/// Parameters of the global topology
#[derive(Builder, Clone, Debug, PartialEq, Eq, Getters)]
pub struct TopoQuery {
    duration: QueryDuration,
}

impl QueryParams for TopoQuery {
    fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        self.duration.bind_into(&mut bindings);
        bindings
    }
}

/// Parameters of the instance topology between two services
#[derive(Builder, Clone, Debug, PartialEq, Eq, Getters)]
pub struct ServiceInstanceTopologyQuery {
    client_service_id: String,
    server_service_id: String,
    duration: QueryDuration,
}

impl QueryParams for ServiceInstanceTopologyQuery {
    fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new()
            .bind("clientServiceId", &self.client_service_id)
            .bind("serverServiceId", &self.server_service_id);
        self.duration.bind_into(&mut bindings);
        bindings
    }
}

/// Parameters of a linear metrics query for one entity id
#[derive(Builder, Clone, Debug, PartialEq, Eq, Getters)]
pub struct MetricsQuery {
    metrics_name: String,
    id: String,
    duration: QueryDuration,
}

impl QueryParams for MetricsQuery {
    fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new()
            .bind("metricsName", &self.metrics_name)
            .bind("id", &self.id);
        self.duration.bind_into(&mut bindings);
        bindings
    }
}

/// A [`MetricsQuery`] asking for several series at once
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
pub struct MultipleLinearMetricsQuery {
    metrics: MetricsQuery,
    num_of_linear: u32,
}

impl MultipleLinearMetricsQuery {
    /// `num_of_linear` series of `metrics`
    pub const fn new(metrics: MetricsQuery, num_of_linear: u32) -> MultipleLinearMetricsQuery {
        MultipleLinearMetricsQuery {
            metrics,
            num_of_linear,
        }
    }
}

impl QueryParams for MultipleLinearMetricsQuery {
    fn bindings(&self) -> Bindings {
        self.metrics
            .bindings()
            .bind("numOfLinear", self.num_of_linear)
    }
}

/// Parameters of a metrics read addressed by service and instance names
#[derive(Builder, Clone, Debug, PartialEq, Eq, Getters)]
pub struct ReadMetricsQuery {
    metrics_name: String,
    service_name: String,
    instance_name: String,
    duration: QueryDuration,
}

impl QueryParams for ReadMetricsQuery {
    fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new()
            .bind("metricsName", &self.metrics_name)
            .bind("serviceName", &self.service_name)
            .bind("instanceName", &self.instance_name);
        self.duration.bind_into(&mut bindings);
        bindings
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use speculoos::prelude::*;
    use std::str::FromStr;

    use super::*;
    use crate::QueryErrorKind;

    #[rstest]
    #[case::day(Step::Day, "2021-03-04")]
    #[case::hour(Step::Hour, "2021-03-04 05")]
    #[case::minute(Step::Minute, "2021-03-04 0506")]
    #[case::second(Step::Second, "2021-03-04 050607")]
    fn steps_render_bounds_at_their_granularity(#[case] step: Step, #[case] expected: &str) {
        let instant = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(step.format(instant), expected);
    }

    #[test]
    fn enums_render_as_graphql_enum_values() {
        assert_eq!(Step::Minute.to_string(), "MINUTE");
        assert_eq!(TraceState::Success.to_string(), "SUCCESS");
        assert_eq!(QueryOrder::ByStartTime.to_string(), "BY_START_TIME");
        assert_that!(QueryOrder::from_str("by_duration")).is_ok_containing(QueryOrder::ByDuration);
    }

    #[test]
    fn duration_window_ends_at_the_given_instant() {
        let now = Utc.with_ymd_and_hms(2021, 3, 4, 5, 30, 0).unwrap();
        let duration =
            QueryDuration::ending_at(now, TimeDelta::minutes(15), Step::Minute).unwrap();
        assert_eq!(duration.start(), "2021-03-04 0515");
        assert_eq!(duration.end(), "2021-03-04 0530");
        assert_eq!(duration.step(), &Step::Minute);
    }

    #[rstest]
    #[case::zero(TimeDelta::zero())]
    #[case::negative(TimeDelta::minutes(-30))]
    fn empty_or_inverted_windows_are_rejected(#[case] window: TimeDelta) {
        let now = Utc.with_ymd_and_hms(2021, 3, 4, 5, 30, 0).unwrap();
        assert_that!(QueryDuration::ending_at(now, window, Step::Minute))
            .is_err()
            .matches(|err| err.kind() == QueryErrorKind::Config);
    }

    #[test]
    fn window_reaching_before_time_began_is_rejected() {
        let now = Utc.with_ymd_and_hms(2021, 3, 4, 5, 30, 0).unwrap();
        assert_that!(QueryDuration::ending_at(now, TimeDelta::MAX, Step::Minute)).is_err();
    }

    #[rstest]
    #[case::overflowing_minutes(i64::MAX)]
    #[case::too_long_ago(100_000_000_000_000)]
    #[case::negative(-30)]
    fn unrepresentable_minute_windows_are_rejected(#[case] minutes: i64) {
        assert_that!(QueryDuration::last_minutes(minutes, Step::Minute)).is_err();
    }

    #[test]
    fn recent_minute_windows_are_ordered() {
        let duration = QueryDuration::last_minutes(30, Step::Second).unwrap();
        assert_that!(duration.start() < duration.end()).is_true();
    }

    #[test]
    fn traces_query_fills_in_paging_defaults() {
        let query = TracesQuery::builder()
            .duration(QueryDuration::new("a", "b", Step::Second))
            .build();
        let bindings = query.bindings();
        assert_that!(bindings.get("traceState")).is_equal_to(Some("ALL"));
        assert_that!(bindings.get("pageNum")).is_equal_to(Some("1"));
        assert_that!(bindings.get("pageSize")).is_equal_to(Some("15"));
        assert_that!(bindings.get("needTotal")).is_equal_to(Some("true"));
        assert_that!(bindings.get("queryOrder")).is_equal_to(Some("BY_DURATION"));
        assert_that!(bindings.get("step")).is_equal_to(Some("SECOND"));
    }

    #[test]
    fn multiple_linear_metrics_extends_the_metrics_bindings() {
        let metrics = MetricsQuery::builder()
            .metrics_name("service_percentile")
            .id("c3Zj.1")
            .duration(QueryDuration::new("a", "b", Step::Minute))
            .build();
        let bindings = MultipleLinearMetricsQuery::new(metrics, 5).bindings();
        let names: Vec<_> = bindings.names().collect();
        assert_eq!(
            names,
            vec!["metricsName", "id", "start", "end", "step", "numOfLinear"]
        );
        assert_that!(bindings.get("numOfLinear")).is_equal_to(Some("5"));
    }
}
