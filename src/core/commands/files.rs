use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use super::{Category, CommandContext, CommandError, CommandOutput, CommandRegistry, CommandResult};

const LISTING_WIDTH: usize = 80;

pub(super) fn register(registry: &mut CommandRegistry) {
    registry.register_with_aliases(&["ls", "dir"], Category::File, "List directory contents", ls);
    registry.register("pwd", Category::File, "Print working directory", pwd);
    registry.register_with_aliases(&["mkdir", "md"], Category::File, "Create directory", mkdir);
    registry.register_with_aliases(&["rmdir", "rd"], Category::File, "Remove directory", rmdir);
    registry.register_with_aliases(&["rm", "del"], Category::File, "Remove files", rm);
    registry.register_with_aliases(&["cp", "copy"], Category::File, "Copy files", cp);
    registry.register_with_aliases(&["mv", "move"], Category::File, "Move/rename files", mv);
    registry.register("touch", Category::File, "Create empty file", touch);
    registry.register_with_aliases(&["cat", "type"], Category::File, "Display file contents", cat);
}

/// Join per-item messages into one output block.
fn report(lines: Vec<String>) -> CommandResult {
    Ok(CommandOutput::Text(lines.join("\n")))
}

/// Readable form of an io error without the trailing "(os error N)".
fn describe(err: &io::Error) -> String {
    match err.kind() {
        ErrorKind::NotFound => "No such file or directory".to_string(),
        ErrorKind::PermissionDenied => "Permission denied".to_string(),
        ErrorKind::AlreadyExists => "File exists".to_string(),
        _ => {
            let text = err.to_string();
            match text.find(" (os error") {
                Some(idx) => text[..idx].to_string(),
                None => text,
            }
        }
    }
}

fn ls(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let mut show_hidden = false;
    let mut show_long = false;
    let mut paths = Vec::new();

    for arg in args {
        if let Some(flags) = arg.strip_prefix('-') {
            show_hidden |= flags.contains('a');
            show_long |= flags.contains('l');
        } else {
            paths.push(arg.as_str());
        }
    }

    let current = ctx.state.current_directory().display().to_string();
    if paths.is_empty() {
        paths.push(&current);
    }

    let mut output = Vec::new();
    for path in paths {
        let full_path = ctx.state.resolve(path);
        let metadata = match fs::metadata(&full_path) {
            Ok(metadata) => metadata,
            Err(_) => {
                output.push(format!("ls: cannot access '{}': No such file or directory", path));
                continue;
            }
        };

        if !metadata.is_dir() {
            if show_long {
                output.push(long_listing(&[full_path.as_path()]));
            } else {
                output.push(file_name(&full_path));
            }
            continue;
        }

        let mut items: Vec<String> = match fs::read_dir(&full_path) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| show_hidden || !name.starts_with('.'))
                .collect(),
            Err(_) => {
                output.push(format!("ls: cannot open directory '{}': Permission denied", path));
                continue;
            }
        };
        items.sort();

        if show_long {
            let item_paths: Vec<_> = items.iter().map(|item| full_path.join(item)).collect();
            let refs: Vec<&Path> = item_paths.iter().map(|p| p.as_path()).collect();
            output.push(long_listing(&refs));
        } else {
            output.push(columns(&full_path, &items));
        }
    }

    report(output)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn columns(dir: &Path, items: &[String]) -> String {
    let Some(max_width) = items.iter().map(|item| item.chars().count()).max() else {
        return String::new();
    };
    let cell = max_width + 2;
    let cols = (LISTING_WIDTH / cell).max(1);

    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        let mut name = item.clone();
        if dir.join(item).is_dir() {
            name.push('/');
        }
        out.push_str(&format!("{:<width$}", name, width = cell));
        if (i + 1) % cols == 0 {
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

fn long_listing(paths: &[&Path]) -> String {
    paths
        .iter()
        .map(|path| match fs::symlink_metadata(path) {
            Ok(metadata) => {
                let modified: DateTime<Local> =
                    metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH).into();
                format!(
                    "{} {:>8} {} {}",
                    permissions(&metadata),
                    metadata.len(),
                    modified.format("%b %d %H:%M"),
                    file_name(path)
                )
            }
            Err(_) => format!("????????? ? ? ? {}", file_name(path)),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn file_type_char(metadata: &Metadata) -> char {
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        'l'
    } else if file_type.is_dir() {
        'd'
    } else {
        '-'
    }
}

#[cfg(unix)]
fn permissions(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode();
    let mut perms = String::with_capacity(10);
    perms.push(file_type_char(metadata));
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        perms.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        perms.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        perms.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    perms
}

#[cfg(not(unix))]
fn permissions(metadata: &Metadata) -> String {
    let write = if metadata.permissions().readonly() { '-' } else { 'w' };
    format!("{}r{}-r{}-r{}-", file_type_char(metadata), write, write, write)
}

fn pwd(ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Ok(ctx.state.current_directory().display().to_string().into())
}

fn mkdir(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let mut create_parents = false;
    let mut targets = Vec::new();

    for arg in args {
        match arg.as_str() {
            "-p" => create_parents = true,
            opt if opt.starts_with('-') => {
                return Err(CommandError::InvalidArguments(format!("invalid option: {}", opt)))
            }
            name => targets.push(name),
        }
    }

    if targets.is_empty() {
        return Err(CommandError::InvalidArguments("missing operand".into()));
    }

    let mut results = Vec::new();
    for name in targets {
        let full_path = ctx.state.resolve(name);
        let created = if create_parents {
            fs::create_dir_all(&full_path)
        } else {
            fs::create_dir(&full_path)
        };
        if let Err(e) = created {
            results.push(format!("mkdir: cannot create directory '{}': {}", name, describe(&e)));
        }
    }

    report(results)
}

fn rmdir(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    if args.is_empty() {
        return Err(CommandError::InvalidArguments("missing operand".into()));
    }

    let mut results = Vec::new();
    for name in args {
        if name.starts_with('-') {
            results.push(format!("rmdir: invalid option: {}", name));
            continue;
        }
        if let Err(e) = fs::remove_dir(ctx.state.resolve(name)) {
            results.push(format!("rmdir: failed to remove '{}': {}", name, describe(&e)));
        }
    }

    report(results)
}

fn rm(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let mut recursive = false;
    let mut force = false;
    let mut targets = Vec::new();

    for arg in args {
        match arg.as_str() {
            "-r" | "-R" => recursive = true,
            "-f" => force = true,
            "-rf" | "-fr" => {
                recursive = true;
                force = true;
            }
            opt if opt.starts_with('-') => {
                return Err(CommandError::InvalidArguments(format!("invalid option: {}", opt)))
            }
            name => targets.push(name),
        }
    }

    if targets.is_empty() {
        return Err(CommandError::InvalidArguments("missing operand".into()));
    }

    let mut results = Vec::new();
    for name in targets {
        let full_path = ctx.state.resolve(name);
        let removed = match fs::symlink_metadata(&full_path) {
            Ok(metadata) if metadata.is_dir() => {
                if !recursive {
                    results.push(format!("rm: cannot remove '{}': Is a directory", name));
                    continue;
                }
                fs::remove_dir_all(&full_path)
            }
            Ok(_) => fs::remove_file(&full_path),
            Err(e) => Err(e),
        };

        if let Err(e) = removed {
            if !force {
                results.push(format!("rm: cannot remove '{}': {}", name, describe(&e)));
            }
        }
    }

    report(results)
}

/// Copy `src` into `dst` recursively. `dst` must not exist yet.
fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    if dst.exists() {
        return Err(io::Error::new(ErrorKind::AlreadyExists, "File exists"));
    }
    // Listed before `dst` exists so a destination inside `src` is not walked.
    let entries = fs::read_dir(src)?.collect::<io::Result<Vec<_>>>()?;
    fs::create_dir_all(dst)?;
    for entry in entries {
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

fn cp(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let Some((destination, rest)) = args.split_last().filter(|(_, rest)| !rest.is_empty()) else {
        return Err(CommandError::InvalidArguments("missing file operand".into()));
    };

    let mut recursive = false;
    let mut sources = Vec::new();
    for arg in rest {
        match arg.as_str() {
            "-r" | "-R" => recursive = true,
            opt if opt.starts_with('-') => {
                return Err(CommandError::InvalidArguments(format!("invalid option: {}", opt)))
            }
            name => sources.push(name),
        }
    }

    if sources.is_empty() {
        return Err(CommandError::InvalidArguments("missing file operand".into()));
    }

    let dest_path = ctx.state.resolve(destination);
    let mut results = Vec::new();
    for source in sources {
        let source_path = ctx.state.resolve(source);
        if !source_path.exists() {
            results.push(format!("cp: cannot stat '{}': No such file or directory", source));
            continue;
        }

        let final_dest = if dest_path.is_dir() {
            dest_path.join(file_name(&source_path))
        } else {
            dest_path.clone()
        };

        let copied = if source_path.is_dir() {
            if !recursive {
                results.push(format!("cp: -r not specified; omitting directory '{}'", source));
                continue;
            }
            if final_dest.starts_with(&source_path) {
                results.push(format!(
                    "cp: cannot copy a directory, '{}', into itself, '{}'",
                    source, destination
                ));
                continue;
            }
            copy_dir_all(&source_path, &final_dest)
        } else {
            fs::copy(&source_path, &final_dest).map(|_| ())
        };

        if let Err(e) = copied {
            results.push(format!("cp: cannot copy '{}': {}", source, describe(&e)));
        }
    }

    report(results)
}

fn mv(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let Some((destination, sources)) = args.split_last().filter(|(_, rest)| !rest.is_empty()) else {
        return Err(CommandError::InvalidArguments("missing file operand".into()));
    };

    let dest_path = ctx.state.resolve(destination);
    let mut results = Vec::new();
    for source in sources {
        let source_path = ctx.state.resolve(source);
        if fs::symlink_metadata(&source_path).is_err() {
            results.push(format!("mv: cannot stat '{}': No such file or directory", source));
            continue;
        }

        let final_dest = if dest_path.is_dir() {
            dest_path.join(file_name(&source_path))
        } else {
            dest_path.clone()
        };

        if let Err(e) = fs::rename(&source_path, &final_dest) {
            results.push(format!("mv: cannot move '{}': {}", source, describe(&e)));
        }
    }

    report(results)
}

fn touch(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    if args.is_empty() {
        return Err(CommandError::InvalidArguments("missing file operand".into()));
    }

    let mut results = Vec::new();
    for name in args {
        if name.starts_with('-') {
            results.push(format!("touch: invalid option: {}", name));
            continue;
        }

        let full_path = ctx.state.resolve(name);
        let touched = if full_path.exists() {
            OpenOptions::new()
                .append(true)
                .open(&full_path)
                .and_then(|file| file.set_modified(SystemTime::now()))
        } else {
            File::create(&full_path).map(|_| ())
        };

        if let Err(e) = touched {
            results.push(format!("touch: cannot touch '{}': {}", name, describe(&e)));
        }
    }

    report(results)
}

fn cat(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    if args.is_empty() {
        return match ctx.input {
            Some(input) => Ok(input.trim_end_matches('\n').into()),
            None => Err(CommandError::InvalidArguments("missing file operand".into())),
        };
    }

    let mut output = Vec::new();
    for name in args {
        if name.starts_with('-') {
            output.push(format!("cat: invalid option: {}", name));
            continue;
        }

        let full_path = ctx.state.resolve(name);
        if full_path.is_dir() {
            output.push(format!("cat: {}: Is a directory", name));
            continue;
        }

        match fs::read(&full_path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                output.push(content.trim_end_matches('\n').to_string());
            }
            Err(e) => output.push(format!("cat: {}: {}", name, describe(&e))),
        }
    }

    report(output)
}

#[cfg(test)]
mod tests {
    use crate::core::commands::test_support::Fixture;
    use super::copy_dir_all;
    use crate::core::commands::CommandError;
    use std::fs;

    #[test]
    fn test_mkdir_and_exists_error() {
        let mut fx = Fixture::new();
        assert_eq!(fx.text("mkdir", &["a", "b"]), "");
        assert!(fx.root().join("a").is_dir());
        assert!(fx.root().join("b").is_dir());

        let out = fx.text("mkdir", &["a"]);
        assert_eq!(out, "mkdir: cannot create directory 'a': File exists");
    }

    #[test]
    fn test_mkdir_parents_and_bad_option() {
        let mut fx = Fixture::new();
        assert_eq!(fx.text("md", &["-p", "x/y/z"]), "");
        assert!(fx.root().join("x/y/z").is_dir());

        assert!(matches!(
            fx.run("mkdir", &["-q", "d"]),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(matches!(fx.run("mkdir", &[]), Err(CommandError::InvalidArguments(_))));
    }

    #[test]
    fn test_touch_and_ls() {
        let mut fx = Fixture::new();
        assert_eq!(fx.text("touch", &["b.txt", "a.txt", ".hidden"]), "");
        fs::create_dir(fx.root().join("sub")).unwrap();

        let listing = fx.text("ls", &[]);
        assert!(listing.contains("a.txt"));
        assert!(listing.contains("b.txt"));
        assert!(listing.contains("sub/"));
        assert!(!listing.contains(".hidden"));
        assert!(listing.find("a.txt") < listing.find("b.txt"));

        let all = fx.text("dir", &["-a"]);
        assert!(all.contains(".hidden"));
    }

    #[test]
    fn test_ls_long_and_missing() {
        let mut fx = Fixture::new();
        fs::write(fx.root().join("data.bin"), vec![0u8; 42]).unwrap();

        let long = fx.text("ls", &["-l"]);
        let line = long.lines().find(|l| l.ends_with("data.bin")).unwrap();
        assert!(line.starts_with('-'));
        assert!(line.contains("42"));

        let single = fx.text("ls", &["data.bin"]);
        assert_eq!(single, "data.bin");

        let missing = fx.text("ls", &["nope"]);
        assert_eq!(missing, "ls: cannot access 'nope': No such file or directory");
    }

    #[test]
    fn test_rm_batch_continues_past_failures() {
        let mut fx = Fixture::new();
        fs::write(fx.root().join("one"), "1").unwrap();
        fs::write(fx.root().join("two"), "2").unwrap();
        fs::create_dir(fx.root().join("dir")).unwrap();

        let out = fx.text("rm", &["one", "missing", "dir", "two"]);
        assert!(out.contains("rm: cannot remove 'missing': No such file or directory"));
        assert!(out.contains("rm: cannot remove 'dir': Is a directory"));
        assert!(!fx.root().join("one").exists());
        assert!(!fx.root().join("two").exists());
        assert!(fx.root().join("dir").exists());
    }

    #[test]
    fn test_rm_recursive_force() {
        let mut fx = Fixture::new();
        fs::create_dir_all(fx.root().join("tree/leaf")).unwrap();
        fs::write(fx.root().join("tree/leaf/f"), "x").unwrap();

        assert_eq!(fx.text("del", &["-rf", "tree", "ghost"]), "");
        assert!(!fx.root().join("tree").exists());
    }

    #[test]
    fn test_rmdir() {
        let mut fx = Fixture::new();
        fs::create_dir(fx.root().join("empty")).unwrap();
        assert_eq!(fx.text("rd", &["empty"]), "");
        assert!(!fx.root().join("empty").exists());

        let out = fx.text("rmdir", &["-x", "gone"]);
        assert!(out.starts_with("rmdir: invalid option: -x"));
        assert!(out.contains("rmdir: failed to remove 'gone'"));
    }

    #[test]
    fn test_cp_file_and_into_dir() {
        let mut fx = Fixture::new();
        fs::write(fx.root().join("a b.txt"), "content").unwrap();
        fs::create_dir(fx.root().join("dest")).unwrap();

        assert_eq!(fx.text("cp", &["a b.txt", "copy.txt"]), "");
        assert_eq!(fs::read_to_string(fx.root().join("copy.txt")).unwrap(), "content");

        assert_eq!(fx.text("copy", &["a b.txt", "dest"]), "");
        assert!(fx.root().join("dest/a b.txt").exists());
    }

    #[test]
    fn test_cp_directory_needs_recursive() {
        let mut fx = Fixture::new();
        fs::create_dir_all(fx.root().join("src/inner")).unwrap();
        fs::write(fx.root().join("src/inner/f"), "x").unwrap();

        let out = fx.text("cp", &["src", "dst"]);
        assert_eq!(out, "cp: -r not specified; omitting directory 'src'");

        assert_eq!(fx.text("cp", &["-r", "src", "dst"]), "");
        assert_eq!(fs::read_to_string(fx.root().join("dst/inner/f")).unwrap(), "x");

        assert!(matches!(fx.run("cp", &["only"]), Err(CommandError::InvalidArguments(_))));
    }

    #[test]
    fn test_cp_directory_into_itself() {
        let mut fx = Fixture::new();
        fs::create_dir(fx.root().join("src")).unwrap();
        fs::write(fx.root().join("src/f"), "x").unwrap();

        assert_eq!(
            fx.text("cp", &["-r", "src", "src/sub"]),
            "cp: cannot copy a directory, 'src', into itself, 'src/sub'"
        );
        assert!(!fx.root().join("src/sub").exists());

        assert_eq!(
            fx.text("cp", &["-r", "src", "src"]),
            "cp: cannot copy a directory, 'src', into itself, 'src'"
        );
        assert_eq!(fs::read_dir(fx.root().join("src")).unwrap().count(), 1);
    }

    #[test]
    fn test_copy_dir_all_lists_source_first() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("f"), "x").unwrap();

        copy_dir_all(&src, &src.join("sub")).unwrap();
        assert_eq!(fs::read_to_string(src.join("sub/f")).unwrap(), "x");
        assert!(!src.join("sub/sub").exists());
    }

    #[test]
    fn test_mv() {
        let mut fx = Fixture::new();
        fs::write(fx.root().join("old"), "x").unwrap();
        fs::create_dir(fx.root().join("box")).unwrap();

        assert_eq!(fx.text("mv", &["old", "new"]), "");
        assert!(fx.root().join("new").exists());
        assert_eq!(fx.text("move", &["new", "box"]), "");
        assert!(fx.root().join("box/new").exists());

        let out = fx.text("mv", &["ghost", "box"]);
        assert_eq!(out, "mv: cannot stat 'ghost': No such file or directory");
    }

    #[test]
    fn test_cat() {
        let mut fx = Fixture::new();
        fs::write(fx.root().join("a.txt"), "line1\nline2\n").unwrap();
        fs::create_dir(fx.root().join("d")).unwrap();

        assert_eq!(fx.text("cat", &["a.txt"]), "line1\nline2");
        let out = fx.text("type", &["d", "missing"]);
        assert_eq!(out, "cat: d: Is a directory\ncat: missing: No such file or directory");
    }

    #[test]
    fn test_cat_reads_redirected_input() {
        let mut fx = Fixture::new();
        let out = fx.run_with_input("cat", &[], Some("from stdin\n")).unwrap();
        assert_eq!(out.text(), "from stdin");
        assert!(fx.run("cat", &[]).is_err());
    }

    #[test]
    fn test_pwd_follows_session() {
        let mut fx = Fixture::new();
        fs::create_dir(fx.root().join("inner")).unwrap();
        assert!(fx.state.set_current_directory("inner"));
        assert_eq!(fx.text("pwd", &[]), fx.root().join("inner").display().to_string());
    }
}
