use nfcport_device::{NfcPort400, PollingRequest};
use nfcport_transport::SerialLink;
use tracing::{info, warn};

use crate::cmd::PollArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_card, OutputFormat};

pub fn run(args: PollArgs, format: OutputFormat) -> CliResult<i32> {
    let request = PollingRequest::new(args.system_code)
        .request_code(args.request_code)
        .time_slot(args.time_slot);
    let mut reader = args.device.open()?;

    if !args.no_setup {
        reader
            .open_felica()
            .map_err(|err| device_error("FeliCa setup failed", err))?;
    }

    let result = reader.felica_polling(&request);

    if !args.no_setup {
        close(&mut reader);
    }

    let card = result.map_err(|err| device_error("polling failed", err))?;
    info!(idm = %card.idm_hex(), "card found");
    print_card(request.system_code, &card, format);
    Ok(SUCCESS)
}

/// Leave the reader idle. A failure here does not change the poll result.
fn close<L: SerialLink>(reader: &mut NfcPort400<L>) {
    if let Err(err) = reader.close_felica() {
        warn!(error = %err, "failed to close FeliCa session");
    }
}
