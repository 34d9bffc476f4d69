use std::{str::FromStr, time::Duration};

use camino::Utf8PathBuf;
use clap::{
    builder::{PossibleValuesParser, TypedValueParser},
    Args, Parser, Subcommand,
};
use oap_http::HttpServiceConfig;
use serde::Serialize;
use timber::{Level, LEVELS};
use url::Url;

use crate::{
    blocking::QueryClient,
    client::{endpoint_for, QueryClientConfig},
    error::QueryError,
    params::{
        EndpointQuery, InstancesQuery, MetricsQuery, QueryDuration, QueryOrder, ReadMetricsQuery,
        ServiceInstanceTopologyQuery, ServicesQuery, Step, TopoQuery, TraceState, TracesQuery,
    },
};

#[derive(Debug, Parser)]
#[command(
    name = "oap-query",
    version,
    about = "
oap-query - run the canned GraphQL queries against an OAP backend

Every command prints the decoded result as pretty JSON. For example:

    $ oap-query services --last-minutes 30
    $ oap-query metrics --name service_sla --id c2VydmljZQ==.1
"
)]
pub struct OapQuery {
    #[command(subcommand)]
    pub command: Command,

    /// Specify the log level
    #[arg(
        long = "log",
        short = 'l',
        global = true,
        ignore_case = true,
        value_parser = PossibleValuesParser::new(LEVELS).try_map(|level| Level::from_str(&level))
    )]
    pub log_level: Option<Level>,

    #[command(flatten)]
    pub connection: ConnectionOpts,
}

#[derive(Debug, Args)]
pub struct ConnectionOpts {
    /// Full GraphQL endpoint; takes precedence over --host and --port
    #[arg(long, global = true, env = "OAP_ENDPOINT")]
    pub endpoint: Option<Url>,

    #[arg(long, global = true, env = "OAP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, global = true, env = "OAP_PORT", default_value_t = 12800)]
    pub port: u16,

    /// Directory of `.gql` files overriding the built-in templates
    #[arg(long, global = true, env = "OAP_TEMPLATES")]
    pub templates: Option<Utf8PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl ConnectionOpts {
    pub fn client_config(&self) -> anyhow::Result<QueryClientConfig> {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => endpoint_for(&self.host, self.port)?,
        };
        let http = HttpServiceConfig::builder()
            .and_timeout(self.timeout.map(Duration::from_secs))
            .build();
        Ok(QueryClientConfig::builder()
            .endpoint(endpoint)
            .and_templates(self.templates.clone())
            .http(http)
            .build())
    }
}

/// The time window a query covers
#[derive(Debug, Args)]
pub struct WindowOpts {
    /// Window start, already formatted for --step
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Window end, already formatted for --step
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    #[arg(long, value_enum, default_value_t = Step::Minute)]
    pub step: Step,

    /// Size of a window ending now, used when --start and --end are absent
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(1..))]
    pub last_minutes: u32,
}

impl WindowOpts {
    pub fn duration(&self) -> Result<QueryDuration, QueryError> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Ok(QueryDuration::new(start, end, self.step)),
            _ => QueryDuration::last_minutes(i64::from(self.last_minutes), self.step),
        }
    }
}

/// Addresses one metric of one entity
#[derive(Debug, Args)]
pub struct MetricsOpts {
    /// Metrics name, e.g. service_sla
    #[arg(long)]
    pub name: String,

    /// Entity id
    #[arg(long)]
    pub id: String,

    #[command(flatten)]
    pub window: WindowOpts,
}

impl MetricsOpts {
    fn query(&self) -> Result<MetricsQuery, QueryError> {
        Ok(MetricsQuery::builder()
            .metrics_name(&self.name)
            .id(&self.id)
            .duration(self.window.duration()?)
            .build())
    }
}

/// Addresses one metric of one service instance by name
#[derive(Debug, Args)]
pub struct ReadMetricsOpts {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub service_name: String,

    #[arg(long)]
    pub instance_name: String,

    #[command(flatten)]
    pub window: WindowOpts,
}

impl ReadMetricsOpts {
    fn query(&self) -> Result<ReadMetricsQuery, QueryError> {
        Ok(ReadMetricsQuery::builder()
            .metrics_name(&self.name)
            .service_name(&self.service_name)
            .instance_name(&self.instance_name)
            .duration(self.window.duration()?)
            .build())
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List traces
    Traces {
        #[arg(long, value_enum)]
        trace_state: Option<TraceState>,

        #[arg(long)]
        page_num: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,

        #[arg(long, value_enum)]
        query_order: Option<QueryOrder>,

        #[command(flatten)]
        window: WindowOpts,
    },

    /// List services
    Services {
        #[command(flatten)]
        window: WindowOpts,
    },

    /// List the instances of a service
    Instances {
        #[arg(long)]
        service_id: String,

        #[command(flatten)]
        window: WindowOpts,
    },

    /// List the endpoints of a service
    Endpoints {
        #[arg(long)]
        service_id: String,
    },

    /// Fetch the global service topology
    Topo {
        #[command(flatten)]
        window: WindowOpts,
    },

    /// Fetch the instance topology between two services
    InstanceTopo {
        #[arg(long)]
        client_service_id: String,

        #[arg(long)]
        server_service_id: String,

        #[command(flatten)]
        window: WindowOpts,
    },

    /// Fetch a linear metric
    Metrics {
        #[command(flatten)]
        metrics: MetricsOpts,
    },

    /// Fetch several series of a linear metric, e.g. percentiles
    MultipleLinearMetrics {
        #[arg(long, default_value_t = 5)]
        num_of_linear: u32,

        #[command(flatten)]
        metrics: MetricsOpts,
    },

    /// Read metric values of a service instance
    ReadMetrics {
        #[command(flatten)]
        read: ReadMetricsOpts,
    },

    /// Read labeled metric values of a service instance
    ReadLabeledMetrics {
        #[command(flatten)]
        read: ReadMetricsOpts,
    },
}

impl OapQuery {
    /// Runs the selected command and returns its result rendered as pretty JSON
    pub fn run(&self) -> anyhow::Result<String> {
        let client = QueryClient::new(self.connection.client_config()?)?;
        tracing::debug!(endpoint = %client.inner().endpoint(), command = ?self.command);
        match &self.command {
            Command::Traces {
                trace_state,
                page_num,
                page_size,
                query_order,
                window,
            } => {
                let query = TracesQuery::builder()
                    .duration(window.duration()?)
                    .and_trace_state(*trace_state)
                    .and_page_num(*page_num)
                    .and_page_size(*page_size)
                    .and_query_order(*query_order)
                    .build();
                render(&client.traces(&query)?)
            }
            Command::Services { window } => {
                let query = ServicesQuery::builder().duration(window.duration()?).build();
                render(&client.services(&query)?)
            }
            Command::Instances { service_id, window } => {
                let query = InstancesQuery::builder()
                    .service_id(service_id)
                    .duration(window.duration()?)
                    .build();
                render(&client.instances(&query)?)
            }
            Command::Endpoints { service_id } => {
                let query = EndpointQuery::builder().service_id(service_id).build();
                render(&client.endpoints(&query)?)
            }
            Command::Topo { window } => {
                let query = TopoQuery::builder().duration(window.duration()?).build();
                render(&client.topo(&query)?)
            }
            Command::InstanceTopo {
                client_service_id,
                server_service_id,
                window,
            } => {
                let query = ServiceInstanceTopologyQuery::builder()
                    .client_service_id(client_service_id)
                    .server_service_id(server_service_id)
                    .duration(window.duration()?)
                    .build();
                render(&client.service_instance_topo(&query)?)
            }
            Command::Metrics { metrics } => render(&client.metrics(&metrics.query()?)?),
            Command::MultipleLinearMetrics {
                num_of_linear,
                metrics,
            } => render(&client.multiple_linear_metrics(&metrics.query()?, *num_of_linear)?),
            Command::ReadMetrics { read } => render(&client.read_metrics(&read.query()?)?),
            Command::ReadLabeledMetrics { read } => {
                render(&client.read_labeled_metrics(&read.query()?)?)
            }
        }
    }
}

fn render<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
