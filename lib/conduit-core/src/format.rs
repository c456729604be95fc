//! Text renderings of requests and responses.
//!
//! Renderings only include what goes on the wire: request options never
//! appear. Headers are sorted by name so the output is stable.

use std::fmt;

use http::HeaderMap;

use crate::{Request, Response};

/// Renders a value as text.
pub trait Formatter<T: ?Sized> {
    /// Render `value`.
    fn format(&self, value: &T) -> String;
}

/// Renders a request as a `curl` command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlFormatter;

/// Renders requests and responses as they appear on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireFormatter;

fn sorted_headers(headers: &HeaderMap) -> Vec<(&str, String)> {
    let mut sorted = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\\\""))
}

impl Formatter<Request> for CurlFormatter {
    /// Empty when the request has no host yet.
    fn format(&self, request: &Request) -> String {
        let Ok(url) = request.url() else {
            return String::new();
        };

        let mut command = format!("curl --request {}", request.method());
        for (name, value) in sorted_headers(request.headers()) {
            command.push_str(" --header ");
            command.push_str(&quoted(&format!("{name}: {value}")));
        }
        let body = String::from_utf8_lossy(request.body().as_bytes());
        if !body.is_empty() {
            command.push_str(" --data ");
            command.push_str(&quoted(&body));
        }
        command.push(' ');
        command.push_str(&quoted(url.as_str()));
        command
    }
}

impl Formatter<Request> for WireFormatter {
    fn format(&self, request: &Request) -> String {
        let target = request
            .url()
            .map_or_else(|_| request.path().to_owned(), String::from);

        let mut text = format!("{} {target} {:?}\n", request.method(), request.version());
        for (name, value) in sorted_headers(request.headers()) {
            text.push_str(&format!("{name}: {value}\n"));
        }
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(request.body().as_bytes()));
        text
    }
}

impl Formatter<Response> for WireFormatter {
    fn format(&self, response: &Response) -> String {
        let mut text = format!(
            "{:?} {} {}\n",
            response.request().version(),
            response.status(),
            response.reason().unwrap_or_default()
        );
        for (name, value) in sorted_headers(response.headers()) {
            text.push_str(&format!("{name}: {value}\n"));
        }
        text.push('\n');
        if let Ok(body) = std::str::from_utf8(response.body()) {
            text.push_str(body);
        }
        text
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&WireFormatter.format(self))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&WireFormatter.format(self))
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;
    use crate::Method;

    fn request() -> Request {
        Request::builder(Method::Post)
            .url("https://api.example.com/users?active=true")
            .header("X-Trace", "abc")
            .header("Accept", "application/json")
            .body(r#"{"name":"Al"}"#)
            .id("secret-option")
            .build()
            .expect("valid")
    }

    #[test]
    fn curl_rendering() {
        let command = CurlFormatter.format(&request());
        check!(
            command
                == concat!(
                    r#"curl --request POST"#,
                    r#" --header "accept: application/json""#,
                    r#" --header "content-type: text/plain; charset=utf-8""#,
                    r#" --header "x-trace: abc""#,
                    r#" --data "{\"name\":\"Al\"}""#,
                    r#" "https://api.example.com/users?active=true""#,
                )
        );
    }

    #[test]
    fn curl_without_host_is_empty() {
        check!(CurlFormatter.format(&Request::new(Method::Get, "/relative")).is_empty());
    }

    #[test]
    fn wire_rendering_of_request() {
        let text = request().to_string();
        check!(
            text == concat!(
                "POST https://api.example.com/users?active=true HTTP/1.1\n",
                "accept: application/json\n",
                "content-type: text/plain; charset=utf-8\n",
                "x-trace: abc\n",
                "\n",
                r#"{"name":"Al"}"#,
            )
        );
        check!(!text.contains("secret-option"));
    }

    #[test]
    fn wire_rendering_of_response() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "text/plain".parse().expect("value"));
        let response = Response::new(request(), 404, headers, "gone");

        check!(response.to_string() == "HTTP/1.1 404 Not Found\ncontent-type: text/plain\n\ngone");
    }
}
