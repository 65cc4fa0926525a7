use crate::{Error, HttpClient};
use bytes::Bytes;
use http::{Request, Response, Uri};
use serde::Deserialize;

const STATUS_OK: u16 = 200;
const STATUS_PARTIAL_CONTENT: u16 = 206;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Transmission {
    items_received: usize,
    items_accepted: usize,
    #[serde(default)]
    errors: Vec<TransmissionItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransmissionItem {
    status_code: u16,
    #[serde(default)]
    message: String,
}

/// Sends one serialized envelope to the server. Makes exactly one attempt.
pub(crate) async fn send<C: HttpClient + ?Sized>(
    client: &C,
    endpoint: &Uri,
    payload: Bytes,
) -> Result<(), Error> {
    let request = Request::post(endpoint)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(payload)
        .map_err(|err| Error::UploadConnection(err.into()))?;

    let response = client
        .send(request)
        .await
        .map_err(Error::UploadConnection)?;
    handle_response(response)
}

fn handle_response(response: Response<Bytes>) -> Result<(), Error> {
    let status_code = response.status().as_u16();
    match status_code {
        STATUS_OK => Ok(()),
        STATUS_PARTIAL_CONTENT => {
            match serde_json::from_slice::<Transmission>(response.body()) {
                Ok(content) if content.items_received == content.items_accepted => Ok(()),
                Ok(content) => Err(Error::Upload {
                    status_code,
                    message: content
                        .errors
                        .iter()
                        .map(|item| format!("{} {}", item.status_code, item.message))
                        .collect::<Vec<_>>()
                        .join("; "),
                }),
                Err(_) => Err(Error::Upload {
                    status_code,
                    message: body_text(&response),
                }),
            }
        }
        _ => Err(Error::Upload {
            status_code,
            message: body_text(&response),
        }),
    }
}

fn body_text(response: &Response<Bytes>) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn response(status: u16, body: &'static str) -> Response<Bytes> {
        Response::builder()
            .status(status)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[test_case(200, "" ; "ok")]
    #[test_case(206, r#"{"itemsReceived":1,"itemsAccepted":1,"errors":[]}"# ; "partial all accepted")]
    fn accepted(status: u16, body: &'static str) {
        assert!(handle_response(response(status, body)).is_ok());
    }

    #[test_case(206, r#"{"itemsReceived":1,"itemsAccepted":0,"errors":[{"index":0,"statusCode":400,"message":"bad"}]}"#, "400 bad" ; "partial rejected")]
    #[test_case(206, "garbage", "garbage" ; "partial unparsable")]
    #[test_case(400, r#"{"error":"invalid ikey"}"#, r#"{"error":"invalid ikey"}"# ; "bad request")]
    #[test_case(500, "", "" ; "server error")]
    fn rejected(status: u16, body: &'static str, expected_message: &str) {
        match handle_response(response(status, body)) {
            Err(Error::Upload {
                status_code,
                message,
            }) => {
                assert_eq!(status, status_code);
                assert_eq!(expected_message, message);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn invalid_utf8_body_does_not_panic() {
        let response = Response::builder()
            .status(400)
            .body(Bytes::from_static(&[0xff, 0xfe]))
            .unwrap();
        assert!(matches!(
            handle_response(response),
            Err(Error::Upload {
                status_code: 400,
                ..
            })
        ));
    }
}
