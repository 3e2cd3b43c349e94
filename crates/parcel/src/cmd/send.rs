use parcel_transfer::send_file_to;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{transfer_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_receipt, OutputFormat, Receipt};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let remote = resolve_remote(&args)?;

    let summary = send_file_to(args.addr.as_str(), &args.file, &remote, Some(timeout))
        .map_err(|err| transfer_error("send failed", err))?;

    print_receipt(&Receipt::sent(&summary, &args.addr), format);
    Ok(SUCCESS)
}

fn resolve_remote(args: &SendArgs) -> CliResult<String> {
    if let Some(remote) = &args.remote {
        return Ok(remote.clone());
    }
    args.file
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::new(
                USAGE,
                format!(
                    "cannot derive a remote name from {}; pass --remote",
                    args.file.display()
                ),
            )
        })
}
