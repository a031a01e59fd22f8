//! Keeps `tests/unit` in lockstep with `src` and rejects empty test files

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::io;
    use std::path::Path;

    const SRC_DIR: &str = "src";
    const UNIT_DIR: &str = "tests/unit";
    const TESTS_DIR: &str = "tests";

    // Entry points and module declarations carry no logic of their own
    fn is_structural(relative: &str) -> bool {
        relative == "main.rs" || relative == "lib.rs" || relative.ends_with("mod.rs")
    }

    fn relative_paths(dir: &Path, base: &Path, paths: &mut BTreeSet<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let relative = path
                .strip_prefix(base)
                .map_err(|_| io::Error::other("path escaped its base directory"))?
                .to_string_lossy()
                .to_string();

            if path.is_dir() {
                paths.insert(relative);
                relative_paths(&path, base, paths)?;
            } else if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
                paths.insert(relative);
            }
        }
        Ok(())
    }

    fn tree(dir: &str) -> BTreeSet<String> {
        let root = Path::new(dir);
        let mut paths = BTreeSet::new();
        if let Err(error) = relative_paths(root, root, &mut paths) {
            assert!(!root.exists(), "Failed to scan {dir}: {error}");
        }
        paths
    }

    // Tests every source file has a unit test file at the same relative path
    // Verified by adding a source file without a counterpart
    #[test]
    fn test_all_src_files_have_unit_tests() {
        let unit = tree(UNIT_DIR);
        let missing: Vec<String> = tree(SRC_DIR)
            .into_iter()
            .filter(|path| !is_structural(path) && !unit.contains(path))
            .map(|path| format!("  - src/{path} -> tests/unit/{path}"))
            .collect();

        assert!(
            missing.is_empty(),
            "Source files without unit tests:\n{}",
            missing.join("\n")
        );
    }

    // Tests no unit test file outlives its source file
    // Verified by renaming a source file
    #[test]
    fn test_all_unit_tests_have_src_counterparts() {
        let src = tree(SRC_DIR);
        let orphaned: Vec<String> = tree(UNIT_DIR)
            .into_iter()
            .filter(|path| !path.ends_with("mod.rs") && !src.contains(path))
            .map(|path| format!("  - tests/unit/{path} (no src/{path})"))
            .collect();

        assert!(
            orphaned.is_empty(),
            "Unit tests without source files:\n{}",
            orphaned.join("\n")
        );
    }

    // Harness roots such as `tests/unit.rs` only declare the directory of the same name
    fn is_harness_root(path: &Path, base: &Path) -> bool {
        path.parent() == Some(base) && path.with_extension("").is_dir()
    }

    // Tests each unit test directory is wired into the `tests/unit.rs` harness
    // Verified by declaring a module without its path attribute
    #[test]
    fn test_unit_harness_reaches_every_directory() {
        let harness = fs::read_to_string(Path::new(TESTS_DIR).join("unit.rs"))
            .expect("Failed to read unit harness");
        let unwired: Vec<String> = tree(UNIT_DIR)
            .into_iter()
            .filter(|path| !path.contains('/') && Path::new(UNIT_DIR).join(path).is_dir())
            .filter(|dir| !harness.contains(&format!("#[path = \"unit/{dir}/mod.rs\"]")))
            .map(|dir| format!("  - tests/unit/{dir}"))
            .collect();

        assert!(
            unwired.is_empty(),
            "Unit test directories missing from tests/unit.rs:\n{}",
            unwired.join("\n")
        );
    }

    fn files_without_tests(dir: &Path, base: &Path, found: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                files_without_tests(&path, base, found)?;
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
                continue;
            }

            let is_mod = path.file_name().and_then(|name| name.to_str()) == Some("mod.rs");
            if is_mod || is_harness_root(&path, base) {
                continue;
            }

            if !fs::read_to_string(&path)?.contains("#[test]") {
                found.push(format!("  - {}", path.display()));
            }
        }
        Ok(())
    }

    // Tests every test file declares at least one test function
    // Verified by emptying a unit test module
    #[test]
    fn test_all_test_files_contain_tests() {
        let base = Path::new(TESTS_DIR);
        let mut found = Vec::new();
        if let Err(error) = files_without_tests(base, base, &mut found) {
            assert!(!base.exists(), "Failed to scan tests directory: {error}");
        }

        assert!(
            found.is_empty(),
            "Test files without any #[test] functions:\n{}",
            found.join("\n")
        );
    }
}
