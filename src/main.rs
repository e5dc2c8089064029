//! splitcfg CLI
//!
//! Usage:
//!   splitcfg [OPTIONS] [FILE]
//!
//! Options:
//!   -a, --apk <NAME>  Input artifact name fed to the name templates
//!   -j, --json        Emit the resolved artifact list as JSON
//!   -s, --schema      Show the configuration schema reference
//!   -h, --help        Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use splitcfg::{ConfigurationParser, DiagnosticLog, OutputArtifact};

#[derive(Parser)]
#[command(name = "splitcfg")]
#[command(about = "Split artifact configuration parser and resolver")]
struct Cli {
    /// Configuration file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Input artifact name fed to the name templates
    #[arg(short, long, default_value = "app.apk")]
    apk: String,

    /// Emit the resolved artifact list as JSON
    #[arg(short, long)]
    json: bool,

    /// Show the configuration schema reference
    #[arg(short, long)]
    schema: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.schema {
        print_schema();
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let mut log = DiagnosticLog::new();
    let parser = ConfigurationParser::new(source.clone());
    match parser.parse_with(&cli.apk, &mut log) {
        Some(artifacts) => {
            // Warnings and notes still print on success.
            if !log.is_empty() {
                eprint!("{}", log.render(&source, &filename));
            }
            if cli.json {
                match serde_json::to_string_pretty(&artifacts) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing artifacts: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                for artifact in &artifacts {
                    print_artifact(artifact);
                }
            }
        }
        None => {
            eprint!("{}", log.render(&source, &filename));
            std::process::exit(1);
        }
    }
}

fn print_artifact(artifact: &OutputArtifact) {
    println!("{} (version {})", artifact.name, artifact.version);
    if !artifact.abis.is_empty() {
        let abis: Vec<&str> = artifact.abis.iter().map(|abi| abi.as_str()).collect();
        println!("  abis: {}", abis.join(", "));
    }
    if !artifact.screen_densities.is_empty() {
        let densities: Vec<String> = artifact
            .screen_densities
            .iter()
            .map(|d| d.to_string())
            .collect();
        println!("  densities: {}", densities.join(", "));
    }
    if !artifact.locales.is_empty() {
        let locales: Vec<String> = artifact.locales.iter().map(|l| l.to_string()).collect();
        println!("  locales: {}", locales.join(", "));
    }
    if let Some(sdk) = &artifact.android_sdk {
        let mut parts = Vec::new();
        if let Some(min) = sdk.min_sdk_version {
            parts.push(format!("min {}", min));
        }
        if let Some(target) = sdk.target_sdk_version {
            parts.push(format!("target {}", target));
        }
        if let Some(max) = sdk.max_sdk_version {
            parts.push(format!("max {}", max));
        }
        println!("  sdk: {}", parts.join(", "));
    }
    if !artifact.textures.is_empty() {
        let names: Vec<&str> = artifact.textures.iter().map(|t| t.name.as_str()).collect();
        println!("  textures: {}", names.join(", "));
    }
    if !artifact.features.is_empty() {
        println!("  features: {}", artifact.features.join(", "));
    }
}

fn print_intro() {
    println!(
        r#"splitcfg - split artifact configuration parser and resolver

USAGE:
    splitcfg [OPTIONS] [FILE]
    cat config.xml | splitcfg --apk app.apk

OPTIONS:
    -a, --apk <NAME>   Input artifact name fed to the name templates
    -j, --json         Emit the resolved artifact list as JSON
    -s, --schema       Show the configuration schema reference
    -h, --help         Print help

QUICK START:
    splitcfg --apk app.apk config.xml

This resolves every <artifact> declaration in config.xml into a concrete
output descriptor with a computed file name.
Run --schema for the configuration schema reference."#
    );
}

fn print_schema() {
    println!(
        r#"SPLIT CONFIGURATION SCHEMA
==========================

ROOT
----
<post-process>                 Optional xmlns: http://schemas.android.com/tools/aapt
    <artifacts> ... </artifacts>
    <groups> ... </groups>
</post-process>

ARTIFACTS
---------
<artifact-format>TEMPLATE</artifact-format>
    Global name template for artifacts without a literal name.

<artifact name="..." version="N"
          abi-group="L" screen-density-group="L" locale-group="L"
          android-sdk-group="L" gl-texture-group="L" device-feature-group="L"/>
    All attributes optional. A missing version is the previous artifact's
    version plus one, starting at 1. Group attributes reference <groups>
    labels.

GROUPS
------
<abi-group label="L">
    <abi>armeabi | armeabi-v7a | arm64-v8a | x86 | x86_64 | mips | mips64 | universal</abi>
</abi-group>

<screen-density-group label="L">
    <screen-density>ldpi | mdpi | hdpi | xhdpi | xxhdpi | xxxhdpi | <N>dpi</screen-density>
</screen-density-group>

<locale-group label="L">
    <locale>en | fr-rFR | ...</locale>
</locale-group>

<android-sdk-group label="L">
    <android-sdk minSdkVersion="N" targetSdkVersion="N" maxSdkVersion="N">
        <manifest/>
    </android-sdk>
</android-sdk-group>

<gl-texture-group label="L">
    <gl-texture name="GL_EXT_...">
        <texture-path>assets/dxt1/*</texture-path>
    </gl-texture>
</gl-texture-group>

<device-feature-group label="L">
    <supports-feature>android.hardware.audio.low_latency</supports-feature>
</device-feature-group>

NAME TEMPLATE PLACEHOLDERS
--------------------------
${{basename}}   Input file name without its extension (optional)
${{ext}}        Input file extension, no leading dot (optional; appended
              automatically when absent and the name lacks it)
${{abi}} ${{density}} ${{locale}} ${{sdk}} ${{feature}} ${{gl}}
              Referenced group label. Each referenced axis must appear
              exactly once; an unreferenced axis must not appear."#
    );
}
