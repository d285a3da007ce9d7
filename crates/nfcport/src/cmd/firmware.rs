use crate::cmd::FirmwareArgs;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_firmware, OutputFormat};

pub fn run(args: FirmwareArgs, format: OutputFormat) -> CliResult<i32> {
    let mut reader = args.device.open()?;
    let fw = reader
        .firmware_version()
        .map_err(|err| device_error("firmware query failed", err))?;
    print_firmware(&fw, format);
    Ok(SUCCESS)
}
