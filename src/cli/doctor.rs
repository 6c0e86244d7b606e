//! Diagnostics for store layout and gpg readiness.

use crate::cli::{scan, CliContext};
use crate::constants;
use crate::util::gpg;
use anyhow::Result;
use clap::Args;
use std::fs;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Also try unlocking the key (may prompt for the passphrase)
    #[arg(long)]
    pub unlock: bool,
}

pub fn run(ctx: &CliContext, args: DoctorArgs) -> Result<()> {
    let paths = &ctx.paths;
    let mut ok = 0u32;
    let mut warn = 0u32;
    let mut fail = 0u32;

    println!("Doctor: {}", paths);
    if let Some(w) = &ctx.config_warning {
        println!("  [WARN] {}", w);
        warn += 1;
    }

    let store_ok = paths.root.is_dir();
    if store_ok {
        println!("  [PASS] store root exists: {}", paths.root.display());
        ok += 1;
    } else {
        println!("  [FAIL] store root missing: {}", paths.root.display());
        fail += 1;
    }

    match fs::read_to_string(&paths.gpg_id) {
        Ok(ids) if !ids.trim().is_empty() => {
            let count = ids.lines().filter(|l| !l.trim().is_empty()).count();
            println!("  [PASS] {} lists {} key id(s)", constants::GPG_ID_FILE, count);
            ok += 1;
        }
        Ok(_) => {
            println!("  [WARN] {} is empty", paths.gpg_id.display());
            warn += 1;
        }
        Err(_) => {
            println!("  [WARN] {} missing (not a pass store?)", paths.gpg_id.display());
            warn += 1;
        }
    }

    match gpg::version(&ctx.gpg_program) {
        Ok(version) => {
            println!("  [PASS] {} available: {}", ctx.gpg_program, version);
            ok += 1;
        }
        Err(e) => {
            println!("  [FAIL] {} not usable: {:#}", ctx.gpg_program, e);
            fail += 1;
        }
    }

    if store_ok {
        match scan::collect(&paths.root) {
            Ok(items) if items.is_empty() => {
                println!("  [WARN] no {} entries found", constants::SECRET_EXTENSION);
                warn += 1;
            }
            Ok(items) => {
                println!("  [PASS] {} entries to export", items.len());
                ok += 1;
            }
            Err(e) => {
                println!("  [FAIL] cannot walk store: {:#}", e);
                fail += 1;
            }
        }
    }

    if args.unlock {
        match gpg::unlock(&ctx.gpg_program, constants::UNLOCK_PAYLOAD) {
            Ok(()) => {
                println!("  [PASS] key unlocked");
                ok += 1;
            }
            Err(e) => {
                println!("  [FAIL] key unlock failed: {:#}", e);
                fail += 1;
            }
        }
    }

    println!();
    println!("Doctor summary: {} pass, {} warn, {} fail", ok, warn, fail);
    if fail > 0 {
        std::process::exit(1);
    }
    Ok(())
}
