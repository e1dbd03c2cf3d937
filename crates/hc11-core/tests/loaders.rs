//! Image loaders against files on disk.

use log as _;
use proptest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use std::fs;

use hc11_core::{
    convert_hex_dump, load_binary, load_file, ImageFormat, LoadError, Machine, StepOutcome,
};
use rstest::rstest;

const BLINK_S19: &str = "\
S00F000068656C6C6F202020202000003C
S1070100860597401A
S10501042001D4
S9030100FB
";

#[test]
fn s19_file_loads_and_runs() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("blink.s19");
    fs::write(&path, BLINK_S19).expect("write s19");

    let mut machine = Machine::new();
    load_file(&mut machine, &path, ImageFormat::from_path(&path), 0).expect("load s19");
    assert_eq!(machine.pc(), 0x0100);

    assert_eq!(machine.step(), StepOutcome::Retired { cycles: 2 });
    assert_eq!(machine.step(), StepOutcome::Retired { cycles: 3 });
    assert_eq!(machine.memory().read_silent(0x0040), 0x05);
    assert_eq!(machine.disassemble(0x0104).text, "bra 0x0107");
}

#[test]
fn binary_file_loads_at_origin_without_touching_pc() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("rom.bin");
    fs::write(&path, [0x4F, 0x5F]).expect("write bin");

    let mut machine = Machine::new();
    machine.set_pc(0x1234);
    load_file(&mut machine, &path, ImageFormat::Binary, 0xE000).expect("load bin");
    assert_eq!(machine.pc(), 0x1234);
    assert_eq!(machine.memory().as_slice()[0xE000..0xE002], [0x4F, 0x5F]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut machine = Machine::new();
    let error = load_file(
        &mut machine,
        &dir.path().join("absent.elf"),
        ImageFormat::Elf,
        0,
    )
    .expect_err("missing file");
    assert!(matches!(error, LoadError::Io(_)));
}

#[test]
fn elf_with_two_segments() {
    let mut image = vec![0u8; 0x78];
    image[..4].copy_from_slice(b"\x7FELF");
    image[0x18..0x1C].copy_from_slice(&0x0000_E000_u32.to_be_bytes());
    image[0x2D] = 2;
    for (index, (vaddr, offset)) in [(0xE000_u32, 0x78_u32), (0xFFFE, 0x7A)].iter().enumerate() {
        let header = 0x38 + index * 32;
        image[header..header + 4].copy_from_slice(&offset.to_be_bytes());
        image[header + 4..header + 8].copy_from_slice(&vaddr.to_be_bytes());
        image[header + 12..header + 16].copy_from_slice(&2_u32.to_be_bytes());
    }
    image.extend_from_slice(&[0x20, 0xFE, 0xE0, 0x00]);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("vectors.elf");
    fs::write(&path, &image).expect("write elf");

    let mut machine = Machine::new();
    load_file(&mut machine, &path, ImageFormat::from_path(&path), 0).expect("load elf");
    assert_eq!(machine.pc(), 0xE000);
    assert_eq!(machine.memory().read_u16_silent(0xFFFE), 0xE000);
    assert_eq!(machine.disassemble(0xE000).text, "bra 0xe000");
}

#[test]
fn converted_dump_loads_as_binary() {
    let dump = "\
BUFFALO 3.4 memory dump
/0100:   86059740200000000000000000000000 .
/0110:   00000000000000000000000000000000 .
>
";
    let bytes = convert_hex_dump(dump);
    assert_eq!(bytes.len(), 32);

    let mut machine = Machine::new();
    load_binary(&mut machine, &bytes, 0x0100);
    machine.set_pc(0x0100);
    machine.step();
    assert_eq!(machine.registers().a(), 0x05);
}

#[rstest]
#[case("s19", Some(ImageFormat::S19))]
#[case("ELF", Some(ImageFormat::Elf))]
#[case("bin", Some(ImageFormat::Binary))]
#[case("hex", None)]
fn format_names(#[case] name: &str, #[case] format: Option<ImageFormat>) {
    assert_eq!(ImageFormat::from_name(name), format);
}
