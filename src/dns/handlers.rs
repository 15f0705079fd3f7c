use crate::client_id::Transport;
use crate::dns::context::{Answer, QueryContext};
use crate::dns::pipeline::Pipeline;
use crate::error::Error;
use std::sync::Arc;
use tracing::{debug, error};
use trust_dns_server::authority::MessageResponseBuilder;
use trust_dns_server::client::op::{Header, MessageType, OpCode, ResponseCode};
use trust_dns_server::server::{Protocol, Request, RequestHandler, ResponseHandler, ResponseInfo};

/// Plain DNS request handler, run by the UDP and TCP listeners.
#[derive(Clone)]
pub struct Handler {
    pipeline: Arc<Pipeline>,
}

impl Handler {
    pub(super) fn new(pipeline: Arc<Pipeline>) -> Self {
        Handler { pipeline }
    }

    async fn dispatch_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response: R,
    ) -> Result<ResponseInfo, Error> {
        // If it isn't a query, return NOTIMPL.
        if request.op_code() != OpCode::Query || request.message_type() != MessageType::Query {
            return self.handle_notimpl(request, response).await;
        }

        let transport = match request.protocol() {
            Protocol::Udp => Transport::Udp,
            _ => Transport::Tcp,
        };
        let query = request.query();
        let mut ctx = QueryContext::new(transport, query.name().clone(), query.query_type());
        self.pipeline.process(&mut ctx).await;

        let answer = ctx.into_reply().unwrap_or_else(|err| {
            debug!("refusing query from {}: {err}", request.src());
            Answer {
                response_code: ResponseCode::Refused,
                records: Vec::new(),
            }
        });
        self.send_answer(request, response, answer).await
    }

    async fn handle_notimpl<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> Result<ResponseInfo, Error> {
        let response = MessageResponseBuilder::from_message_request(request);
        Ok(response_handle
            .send_response(response.error_msg(request.header(), ResponseCode::NotImp))
            .await?)
    }

    async fn send_answer<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
        answer: Answer,
    ) -> Result<ResponseInfo, Error> {
        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);
        header.set_response_code(answer.response_code);
        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build(header, answer.records.iter(), &[], &[], &[]);
        Ok(response_handle.send_response(response).await?)
    }
}

#[async_trait::async_trait]
impl RequestHandler for Handler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        match self.dispatch_request(request, response_handle).await {
            Ok(info) => info,
            Err(error) => {
                error!("error in RequestHandler: {:?}", error);
                let mut header = Header::new();
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}
