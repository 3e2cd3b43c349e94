use parcel_frame::{HEADER_SIZE, PACKET_DATA_SIZE, PACKET_SIZE};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("parcel {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: parcel");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("PARCEL_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    // Peers interoperate only when these match.
    println!(
        "wire: header={HEADER_SIZE} packet={PACKET_SIZE} packet_data={PACKET_DATA_SIZE}"
    );
    println!(
        "features: transfer={}, async={}, cli=true",
        cfg!(feature = "transfer"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
