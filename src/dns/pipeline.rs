use crate::client_id::{process_client_id, ServerIdentity, Transport};
use crate::config::Config;
use crate::dhcp::SharedDhcp;
use crate::dns::context::{Answer, Outcome, QueryContext};
use crate::error::Error;
use std::collections::HashMap;
use std::net::IpAddr;
use time::OffsetDateTime;
use trust_dns_server::client::op::{Message, MessageType, OpCode, ResponseCode};
use trust_dns_server::client::rr::{LowerName, RData, Record, RecordType};

/// TTL of answers built from the hosts table and DHCP leases.
const LOCAL_TTL: u32 = 10;

/// One step of query processing. A stage reads the [`QueryContext`] and records its
/// [`Outcome`] on it.
#[async_trait::async_trait]
pub trait Stage: Send + Sync {
    async fn process(&self, ctx: &mut QueryContext);
}

/// Resolves the client id carried by the query's transport.
pub struct ClientIdStage {
    identity: ServerIdentity,
}

impl ClientIdStage {
    #[must_use]
    pub fn new(identity: ServerIdentity) -> Self {
        Self { identity }
    }
}

#[async_trait::async_trait]
impl Stage for ClientIdStage {
    async fn process(&self, ctx: &mut QueryContext) {
        process_client_id(ctx, &self.identity);
    }
}

/// Answers `A` and `AAAA` queries from the configured hosts table and from DHCP lease
/// hostnames under the local domain.
pub struct LocalHostsStage {
    hosts: HashMap<LowerName, Vec<IpAddr>>,
    local_domain: String,
    dhcp: SharedDhcp,
}

impl LocalHostsStage {
    #[must_use]
    pub fn new(hosts: HashMap<LowerName, Vec<IpAddr>>, local_domain: String, dhcp: SharedDhcp) -> Self {
        Self {
            hosts,
            local_domain,
            dhcp,
        }
    }

    /// The lease hostname `name` refers to, if it is a single label under the local domain.
    fn lease_hostname(&self, name: &LowerName) -> Option<String> {
        let name = name.to_string();
        let host = name
            .strip_suffix('.')
            .unwrap_or(name.as_str())
            .strip_suffix(self.local_domain.as_str())?
            .strip_suffix('.')?;
        (!host.is_empty() && !host.contains('.')).then(|| host.to_string())
    }

    async fn addrs(&self, name: &LowerName) -> Option<Vec<IpAddr>> {
        let mut addrs = self.hosts.get(name).cloned();
        if let Some(hostname) = self.lease_hostname(name) {
            let leased = self
                .dhcp
                .read()
                .await
                .addresses_for(&hostname, OffsetDateTime::now_utc())
                .await;
            if !leased.is_empty() {
                addrs.get_or_insert_with(Vec::new).extend(leased);
            }
        }
        addrs
    }
}

#[async_trait::async_trait]
impl Stage for LocalHostsStage {
    async fn process(&self, ctx: &mut QueryContext) {
        let query_type = ctx.query_type();
        if query_type != RecordType::A && query_type != RecordType::AAAA {
            ctx.set_outcome(Outcome::Success);
            return;
        }

        let Some(addrs) = self.addrs(ctx.query_name()).await else {
            ctx.set_outcome(Outcome::Success);
            return;
        };

        let records = addrs
            .iter()
            .filter_map(|ip| match (query_type, ip) {
                (RecordType::A, IpAddr::V4(ipv4_addr)) => Some(RData::A(*ipv4_addr)),
                (RecordType::AAAA, IpAddr::V6(ipv6_addr)) => Some(RData::AAAA(*ipv6_addr)),
                _ => None,
            })
            .map(|rdata| Record::from_rdata(ctx.query_name().into(), LOCAL_TTL, rdata))
            .collect();
        ctx.finish(Answer {
            response_code: ResponseCode::NoError,
            records,
        });
    }
}

/// The ordered stages every query goes through, whichever front end received it.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    #[must_use]
    pub fn from_config(config: &Config, dhcp: SharedDhcp) -> Self {
        Self::new(vec![
            Box::new(ClientIdStage::new(config.server_identity())),
            Box::new(LocalHostsStage::new(
                config.hosts.clone(),
                config.local_domain.clone(),
                dhcp,
            )),
        ])
    }

    /// Run the stages in order until one doesn't report [`Outcome::Success`].
    pub async fn process(&self, ctx: &mut QueryContext) {
        for stage in &self.stages {
            stage.process(ctx).await;
            if !matches!(ctx.outcome(), Some(Outcome::Success)) {
                break;
            }
        }
    }

    /// Process a parsed DNS message received over `transport`, for the front ends that do their
    /// own message framing.
    ///
    /// # Errors
    ///
    /// Returns the error a stage rejected the query with, e.g. [`Error::ClientIdCheck`].
    pub async fn handle_message(&self, transport: Transport, request: &Message) -> Result<Message, Error> {
        if request.op_code() != OpCode::Query || request.message_type() != MessageType::Query {
            return Ok(reply(request, ResponseCode::NotImp, Vec::new()));
        }
        let Some(query) = request.queries().first() else {
            return Ok(reply(request, ResponseCode::FormErr, Vec::new()));
        };

        let mut ctx = QueryContext::new(transport, query.name().into(), query.query_type());
        self.process(&mut ctx).await;
        let answer = ctx.into_reply()?;
        Ok(reply(request, answer.response_code, answer.records))
    }
}

/// Build an authoritative response to `request`.
pub(crate) fn reply(request: &Message, response_code: ResponseCode, answers: Vec<Record>) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_authoritative(true)
        .set_response_code(response_code)
        .add_queries(request.queries().iter().cloned())
        .add_answers(answers);
    response
}
