use crate::client_id::{ClientId, Protocol, Transport};
use crate::error::Error;
use trust_dns_server::client::op::ResponseCode;
use trust_dns_server::client::rr::{LowerName, Record, RecordType};

/// How far a query got through the [pipeline][super::pipeline::Pipeline].
#[derive(Debug)]
pub enum Outcome {
    /// The last stage passed; later stages should run.
    Success,
    /// A stage answered the query; later stages are skipped.
    Finish,
    /// A stage rejected the query.
    Error(Error),
}

/// The response a stage settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub response_code: ResponseCode,
    pub records: Vec<Record>,
}

/// Per-query processing state, created by a front end for each inbound query and handed through
/// the pipeline once.
#[derive(Debug)]
pub struct QueryContext {
    transport: Transport,
    query_name: LowerName,
    query_type: RecordType,
    client_id: Option<ClientId>,
    outcome: Option<Outcome>,
    answer: Option<Answer>,
}

impl QueryContext {
    #[must_use]
    pub fn new(transport: Transport, query_name: LowerName, query_type: RecordType) -> Self {
        Self {
            transport,
            query_name,
            query_type,
            client_id: None,
            outcome: None,
            answer: None,
        }
    }

    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.transport.protocol()
    }

    #[must_use]
    pub fn query_name(&self) -> &LowerName {
        &self.query_name
    }

    #[must_use]
    pub fn query_type(&self) -> RecordType {
        self.query_type
    }

    /// The client id, or `""` for an anonymous client.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client_id.as_ref().map_or("", ClientId::as_str)
    }

    pub fn set_client_id(&mut self, client_id: Option<ClientId>) {
        self.client_id = client_id;
    }

    /// `None` until a stage has run.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    /// The error the query was rejected with; `Some` exactly when the outcome is
    /// [`Outcome::Error`].
    #[must_use]
    pub fn failure(&self) -> Option<&Error> {
        match &self.outcome {
            Some(Outcome::Error(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn answer(&self) -> Option<&Answer> {
        self.answer.as_ref()
    }

    /// Record `answer` and stop the pipeline.
    pub fn finish(&mut self, answer: Answer) {
        self.answer = Some(answer);
        self.outcome = Some(Outcome::Finish);
    }

    /// Consume the context, yielding the response to send.
    ///
    /// Queries nothing answered are refused.
    ///
    /// # Errors
    ///
    /// Returns the error a stage rejected the query with.
    pub fn into_reply(self) -> Result<Answer, Error> {
        match (self.outcome, self.answer) {
            (Some(Outcome::Error(err)), _) => Err(err),
            (Some(Outcome::Finish), Some(answer)) => Ok(answer),
            _ => Ok(Answer {
                response_code: ResponseCode::Refused,
                records: Vec::new(),
            }),
        }
    }
}
