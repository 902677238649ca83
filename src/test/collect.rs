use super::unique_temp_dir;
use crate::collect::collect_scratch;
use std::fs;

#[test]
fn missing_scratch_is_a_noop() {
    let base = unique_temp_dir("collect-missing");
    let workdir = base.join("exp-001");
    fs::create_dir(&workdir).unwrap();

    let moved = collect_scratch(&base.join("scratch"), &workdir).expect("collect");
    assert_eq!(moved, 0);
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn empty_scratch_is_a_noop() {
    let base = unique_temp_dir("collect-empty");
    let scratch = base.join("scratch");
    let workdir = base.join("exp-001");
    fs::create_dir(&scratch).unwrap();
    fs::create_dir(&workdir).unwrap();

    assert_eq!(collect_scratch(&scratch, &workdir).expect("collect"), 0);
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn moves_files_and_directories_into_workdir() {
    let base = unique_temp_dir("collect-move");
    let scratch = base.join("scratch");
    let workdir = base.join("exp-001");
    fs::create_dir(&scratch).unwrap();
    fs::create_dir(&workdir).unwrap();
    fs::write(scratch.join("packet-latency.txt"), b"0 12\n1 13\n").unwrap();
    fs::create_dir(scratch.join("lp-io")).unwrap();
    fs::write(scratch.join("lp-io").join("gvt.bin"), b"xx").unwrap();

    let moved = collect_scratch(&scratch, &workdir).expect("collect");
    assert_eq!(moved, 2);
    assert_eq!(
        fs::read(workdir.join("packet-latency.txt")).unwrap(),
        b"0 12\n1 13\n"
    );
    assert!(workdir.join("lp-io").join("gvt.bin").is_file());
    // scratch itself remains, emptied
    assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn collects_across_filesystems_via_copy_fallback() {
    // tmpfs scratch on a different mount than the workdir, the situation
    // a fast-storage scratch location is in on every cluster node
    let shm = std::path::Path::new("/dev/shm");
    if !shm.is_dir() {
        return;
    }
    let base = unique_temp_dir("collect-xdev");
    let scratch = shm.join(format!(
        "codes-replay-rs-xdev-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    fs::create_dir(&scratch).unwrap();
    let workdir = base.join("exp-001");
    fs::create_dir(&workdir).unwrap();
    fs::write(scratch.join("packet-latency.txt"), b"0 12\n").unwrap();
    fs::create_dir(scratch.join("lp-io")).unwrap();
    fs::write(scratch.join("lp-io").join("gvt.bin"), b"xx").unwrap();

    let moved = collect_scratch(&scratch, &workdir).expect("collect");
    assert_eq!(moved, 2);
    assert_eq!(
        fs::read(workdir.join("packet-latency.txt")).unwrap(),
        b"0 12\n"
    );
    assert_eq!(fs::read(workdir.join("lp-io").join("gvt.bin")).unwrap(), b"xx");
    assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    let _ = fs::remove_dir_all(&scratch);
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn scratch_equal_to_workdir_moves_nothing() {
    let base = unique_temp_dir("collect-same");
    let workdir = base.join("exp-001");
    fs::create_dir(&workdir).unwrap();
    fs::write(workdir.join("model-result.txt"), b"done").unwrap();

    assert_eq!(collect_scratch(&workdir, &workdir).expect("collect"), 0);
    assert!(workdir.join("model-result.txt").is_file());
    let _ = fs::remove_dir_all(&base);
}
