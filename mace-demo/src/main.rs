//! Example build description: a static library linked into an executable.
//!
//! This is what a real project's `macefile.rs` looks like; `mace-bootstrap`
//! compiles a file shaped like this one with `rustc` and runs it.

use mace_core::{Builder, TargetKind, TargetSpec};

fn configure(builder: &mut Builder) -> anyhow::Result<()>
{
    builder.set_compiler("cc");

    builder.target(TargetSpec{
        name: "greet".into(),
        kind: Some(TargetKind::StaticLibrary),
        sources: "demos/hello/src/greet.c".into(),
        includes: "demos/hello/include".into(),
        ..Default::default()
    });

    builder.target(TargetSpec{
        name: "hello".into(),
        kind: Some(TargetKind::Executable),
        sources: "demos/hello/src/main.c".into(),
        includes: "demos/hello/include".into(),
        links: "greet".into(),
        ..Default::default()
    });

    builder.set_default_target("hello");
    Ok(())
}

fn main() -> std::process::ExitCode
{
    mace_core::run(configure)
}
