use nfcport_device::SessionCommand;
use tracing::warn;

use crate::cmd::SessionArgs;
use crate::exit::{device_error, CliResult, DEVICE_STATUS, SUCCESS};
use crate::output::{print_session, OutputFormat};

/// Exits with `DEVICE_STATUS` when the reader answers with anything other
/// than `90 00`; the status is still printed.
pub fn run(args: SessionArgs, format: OutputFormat) -> CliResult<i32> {
    let command = SessionCommand::from(args.action);
    let mut reader = args.device.open()?;
    let sw = reader
        .session(command)
        .map_err(|err| device_error(command.name(), err))?;
    print_session(command, sw, format);

    if sw.is_success() {
        Ok(SUCCESS)
    } else {
        warn!(command = command.name(), status = %sw, "command not accepted");
        Ok(DEVICE_STATUS)
    }
}
