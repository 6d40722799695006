use std::io::Write;

fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f
}

#[test]
fn loads_layout_from_file() {
    let f = write_tmp("1\n1,16\n0,-1.5,-1.5\n1,-0.5,-1.5\n2,0.5,-1.5\n3,1.5,-1.5\n4,-1.5,-0.5\n5,-0.5,-0.5\n6,0.5,-0.5\n7,1.5,-0.5\n8,-1.5,0.5\n9,-0.5,0.5\n10,0.5,0.5\n11,1.5,0.5\n12,-1.5,1.5\n13,-0.5,1.5\n14,0.5,1.5\n15,1.5,1.5\n");
    let patches = skin_config::layout::load(f.path()).unwrap();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].cells.len(), 16);
}

#[test]
fn rejects_truncated_file_with_line_number() {
    let f = write_tmp("2\n1,1\n0,0.0,0.0\n");
    let err = skin_config::layout::load(f.path()).unwrap_err();
    assert!(matches!(err, skin_config::LayoutError::Row { .. }));
}
