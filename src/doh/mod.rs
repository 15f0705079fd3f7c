//! DNS-over-HTTPS listener ([RFC-8484][RFC-8484]).
//!
//! Queries are accepted as `GET` requests carrying the base64url encoded message in the `dns`
//! parameter, or as `POST` requests with an `application/dns-message` body. Responses are
//! always `application/dns-message`.
//!
//! Clients may put their [client id][crate::client_id] in the request path:
//!
//! ```bash
//! ❯ curl -H 'accept: application/dns-message' \
//!     'https://dns.example.com/dns-query/laptop?dns=AAABAAABAAAAAAAABnJvdXRlcgNsYW4AAAEAAQ'
//! ```
//!
//! Requests whose path isn't `/dns-query` or `/dns-query/<client id>` (each with an optional
//! trailing slash), or whose client id is invalid, get HTTP 400 (Bad Request) and a JSON body
//! of the form `{"error": "client id check: ..."}`.
//!
//! [RFC-8484]: https://www.rfc-editor.org/rfc/rfc8484

mod routes;
pub mod server;

pub use server::{serve_plain, serve_tls};
