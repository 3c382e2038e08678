use anyhow::{anyhow, Context, Result};
use glob::glob;
use std::result::Result as StdResult;

use std::fs;
use std::process::Command;

fn main() -> Result<()> {
    compile_bliks().context("compiling interpreter")?;

    let scripts: Vec<_> = glob("tests/*.bks")?.collect::<StdResult<_, _>>()?;
    let mut failures = 0;
    for script in &scripts {
        let expected_path = format!(
            "tests/{}.out",
            script.file_stem().unwrap().to_str().unwrap()
        );
        let expected = fs::read_to_string(&expected_path)
            .context(format!("loading expected output: {}", &expected_path))?;
        let output_bytes = Command::new("../target/release/bliks")
            .arg(script)
            .output()
            .context(format!("running script {}", script.display()))?
            .stdout;
        let output = String::from_utf8(output_bytes)?;
        if output == expected {
            println!("{}: passed", script.display());
        } else {
            failures += 1;
            println!(
                "{}: failed\nactual output:\n{}",
                script.display(),
                output
            );
        }
    }
    if failures == 0 {
        Ok(())
    } else {
        Err(anyhow!("{failures} scripts failed"))
    }
}

fn compile_bliks() -> Result<()> {
    let st = Command::new("cargo")
        .args(["build", "--release", "-p", "interpreter"])
        .current_dir("..")
        .status()?;
    if st.success() {
        Ok(())
    } else {
        Err(anyhow!("compiling the interpreter failed"))
    }
}
