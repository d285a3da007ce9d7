use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("nfcport {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("NFCPORT_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("os: {}", std::env::consts::OS);
    println!("arch: {}", std::env::consts::ARCH);
    println!("features: serial={}, cli=true", cfg!(feature = "serial"));
    println!(
        "defaults: baud={}, max_frame_payload={}",
        nfcport_transport::SerialPortLink::DEFAULT_BAUD_RATE,
        nfcport_frame::DEFAULT_MAX_PAYLOAD
    );

    Ok(SUCCESS)
}
