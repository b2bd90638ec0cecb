use relaymq_client::Client;
use relaymq_frame::FrameConfig;
use relaymq_wire::Message;

use crate::cmd::{parse_duration, StatArgs};
use crate::exit::{client_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_stat, OutputFormat};

pub fn run(args: StatArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let config = FrameConfig {
        read_timeout: Some(timeout),
        ..FrameConfig::default()
    };

    let mut client = Client::connect_with_config(&args.connect.host, args.connect.port, config)
        .map_err(|err| client_error("connect failed", err))?;

    client
        .request_stat(&args.destination)
        .map_err(|err| client_error("stat request failed", err))?;

    let reply = client
        .read_message()
        .map_err(|err| client_error("stat reply failed", err))?;

    let stat = decode_stat_reply(&reply)?;
    print_stat(&stat, format);

    client
        .close()
        .map_err(|err| client_error("close failed", err))?;
    Ok(SUCCESS)
}

fn decode_stat_reply(reply: &Message) -> CliResult<relaymq_wire::Stat> {
    match reply.as_stat() {
        Ok(Some(stat)) => Ok(stat),
        Ok(None) => Err(CliError::new(
            FAILURE,
            format!(
                "expected a stat reply, got a data message for `{}`",
                reply.destination
            ),
        )),
        Err(err) => Err(CliError::new(
            crate::exit::DATA_INVALID,
            format!("stat reply failed to decode: {err}"),
        )),
    }
}
