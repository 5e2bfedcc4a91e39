use std::{env, fs, fs::File, io::prelude::*, path::Path};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=filters/");

    let out_dir = env::var("OUT_DIR")?;
    let manifest_dir = env::var("CARGO_MANIFEST_DIR")?;
    let filters_dir = Path::new(&manifest_dir).join("filters");

    let dest_path = Path::new(&out_dir).join("bundled_filters.rs");
    let mut bundled = File::create(dest_path)?;

    writeln!(&mut bundled, r"&[",)?;

    let mut paths: Vec<_> = fs::read_dir(&filters_dir)?.filter_map(Result::ok).collect();
    paths.sort_by_key(std::fs::DirEntry::path);

    for entry in &paths {
        let path = entry.path();
        let is_manifest = path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml" || e == "json");
        if !is_manifest {
            continue;
        }

        let file_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or("could not get file name")?;
        let path_name = path.display().to_string();
        writeln!(
            &mut bundled,
            r#"    ({file_name:?}, include_str!({path_name:?})),"#
        )?;
    }

    writeln!(&mut bundled, r"]",)?;

    Ok(())
}
