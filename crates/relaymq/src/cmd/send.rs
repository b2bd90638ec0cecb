use std::fs;

use relaymq_client::Client;

use crate::cmd::SendArgs;
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: SendArgs, _format: OutputFormat) -> CliResult<i32> {
    let mut client = Client::connect(&args.connect.host, args.connect.port)
        .map_err(|err| client_error("connect failed", err))?;

    let payload = resolve_payload(&args)?;
    client
        .broadcast(args.destination, payload)
        .map_err(|err| client_error("send failed", err))?;

    client
        .close()
        .map_err(|err| client_error("close failed", err))?;
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::ConnectArgs;

    fn args(data: Option<&str>) -> SendArgs {
        SendArgs {
            destination: "/test".into(),
            data: data.map(str::to_string),
            file: None,
            connect: ConnectArgs {
                host: "localhost".into(),
                port: relaymq_client::DEFAULT_PORT,
            },
        }
    }

    #[test]
    fn resolve_payload_prefers_inline_data() {
        assert_eq!(resolve_payload(&args(Some("hello"))).unwrap(), b"hello");
    }

    #[test]
    fn resolve_payload_defaults_to_empty() {
        assert!(resolve_payload(&args(None)).unwrap().is_empty());
    }

    #[test]
    fn resolve_payload_missing_file_is_error() {
        let mut args = args(None);
        args.file = Some("/nonexistent/definitely-not-here".into());
        assert!(resolve_payload(&args).is_err());
    }
}
