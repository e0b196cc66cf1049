use binobj::util::{BigEndian, LittleEndian};
use binobj::{magic_bytes, BinaryObject, Endian};
use std::collections::VecDeque;
use std::fmt::Debug;

#[derive(Debug, PartialEq, BinaryObject)]
struct UnitStruct;

#[derive(Debug, PartialEq, BinaryObject)]
struct TupleStruct(u8, u32);

#[derive(Debug, PartialEq, BinaryObject)]
struct SparseTuple(u8, #[binobj(ignore)] u16, u8);

#[derive(Debug, PartialEq, BinaryObject)]
#[binobj(constant = 3)]
struct Header {
    kind: u8,
    size: u16,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct Flag {
    on: bool,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct Packet {
    len: u8,
    #[binobj(element_count = "len")]
    data: Vec<u8>,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct FloorPacket {
    total: u8,
    #[binobj(element_count = "total", min_element_count = 2)]
    extra: Vec<u8>,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct Tail {
    #[binobj(read_remaining, min_element_count = 2)]
    rest: Vec<u16>,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct Wrapper {
    header: Header,
    trailer: u8,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct Arrays {
    raw: [u8; 4],
    words: [u16; 2],
}

#[derive(Debug, PartialEq, BinaryObject)]
struct Slices {
    #[binobj(element_count = 3)]
    bytes: Box<[u8]>,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct Ring {
    marker: u8,
    #[binobj(read_remaining)]
    rest: VecDeque<u16>,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct Cached {
    value: u16,
    #[binobj(ignore)]
    checksum: u64,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct Truncated {
    #[binobj(byte_length = 3)]
    value: u32,
    trailer: u8,
}

#[derive(Debug, PartialEq, BinaryObject)]
#[binobj(repr = "u8")]
enum Opcode {
    #[binobj(id = "0x01")]
    Read,
    #[binobj(id = "0x02")]
    Write,
    #[binobj(id = "0xff")]
    Halt,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct HeaderList {
    count: u8,
    #[binobj(element_count = "count")]
    headers: Vec<Header>,
}

#[derive(Debug, PartialEq, BinaryObject)]
struct MixedOrder {
    le: LittleEndian<u16>,
    be: BigEndian<u16>,
}

magic_bytes! {
    #[derive(Debug, PartialEq)]
    Magic(b"BOBJ");
}

#[derive(Debug, PartialEq, BinaryObject)]
struct MagicFile {
    magic: Magic,
    version: u8,
}

fn test_write<T>(value: &T, endian: Endian, expected: &[u8])
where
    T: BinaryObject,
{
    assert_eq!(value.byte_count(), expected.len());
    let bytes = value.to_vec(endian).unwrap();
    assert_eq!(bytes, expected);
}

fn test_read<T>(endian: Endian, input: &[u8], expected: T)
where
    T: BinaryObject + Debug + PartialEq,
{
    let (value, consumed) = T::read_bytes(endian, input).unwrap();
    assert_eq!(value, expected);
    assert_eq!(consumed, input.len());
}

fn test_bidir<T>(value: T, endian: Endian, bytes: &[u8])
where
    T: BinaryObject + Debug + PartialEq,
{
    test_write(&value, endian, bytes);
    test_read(endian, bytes, value);
}

#[test]
fn unit_struct_is_zero_length() {
    assert_eq!(UnitStruct::MIN_BYTE_COUNT, 0);
    test_bidir(UnitStruct, Endian::Big, &[]);
}

#[test]
fn tuple_struct_fields_are_positional() {
    test_bidir(
        TupleStruct(0xab, 0xdeadbeef),
        Endian::Little,
        &[0xab, 0xef, 0xbe, 0xad, 0xde],
    );
}

#[test]
fn tuple_struct_ignored_fields_default_in_place() {
    let value = SparseTuple(0x0a, 0, 0x0b);
    test_write(&value, Endian::Big, &[0x0a, 0x0b]);
    test_read(Endian::Big, &[0x0a, 0x0b], value);
}

#[test]
fn fixed_struct_honors_byte_order() {
    let header = Header {
        kind: 0x01,
        size: 0x0203,
    };
    test_write(&header, Endian::Big, &[0x01, 0x02, 0x03]);
    test_write(&header, Endian::Little, &[0x01, 0x03, 0x02]);
    test_read(Endian::Big, &[0x01, 0x02, 0x03], header);
}

#[test]
fn fixed_struct_min_equals_total() {
    assert_eq!(Header::MIN_BYTE_COUNT, 3);
}

#[test]
fn booleans_encode_as_single_bytes() {
    test_bidir(Flag { on: true }, Endian::Big, &[0x01]);
    test_bidir(Flag { on: false }, Endian::Big, &[0x00]);
    assert!(Flag::read_bytes(Endian::Big, &[0x02]).is_err());
}

#[test]
fn member_driven_count_round_trips() {
    test_bidir(
        Packet {
            len: 3,
            data: vec![1, 2, 3],
        },
        Endian::Little,
        &[0x03, 0x01, 0x02, 0x03],
    );
}

#[test]
fn member_driven_count_must_match_on_write() {
    let packet = Packet {
        len: 2,
        data: vec![1, 2, 3],
    };
    assert!(packet.to_vec(Endian::Little).is_err());
}

#[test]
fn member_driven_read_rejects_short_buffers() {
    assert!(Packet::read_bytes(Endian::Little, &[0x03, 0x01, 0x02]).is_err());
}

#[test]
fn count_floor_stores_only_the_excess() {
    test_bidir(
        FloorPacket {
            total: 5,
            extra: vec![10, 20, 30],
        },
        Endian::Little,
        &[0x05, 0x0a, 0x14, 0x1e],
    );
}

#[test]
fn count_below_floor_is_rejected() {
    assert!(FloorPacket::read_bytes(Endian::Little, &[0x01]).is_err());
    let packet = FloorPacket {
        total: 1,
        extra: vec![],
    };
    assert!(packet.to_vec(Endian::Little).is_err());
}

#[test]
fn remainder_consumes_the_rest_of_the_buffer() {
    test_bidir(
        Tail {
            rest: vec![0x0102, 0x0304, 0x0506],
        },
        Endian::Big,
        &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06],
    );
}

#[test]
fn remainder_minimum_sets_the_minimum_byte_count() {
    assert_eq!(Tail::MIN_BYTE_COUNT, 4);
    assert!(Tail::read_bytes(Endian::Big, &[0x01, 0x02, 0x03]).is_err());
}

#[test]
fn remainder_below_minimum_is_rejected_on_write() {
    let tail = Tail {
        rest: vec![0x0102],
    };
    assert!(tail.to_vec(Endian::Big).is_err());
}

#[test]
fn remainder_rejects_partial_trailing_elements() {
    // five bytes clear the minimum but do not divide into u16 elements
    assert!(Tail::read_bytes(Endian::Big, &[1, 2, 3, 4, 5]).is_err());
}

#[test]
fn nested_objects_delegate() {
    test_bidir(
        Wrapper {
            header: Header {
                kind: 0x01,
                size: 0x0203,
            },
            trailer: 0x09,
        },
        Endian::Big,
        &[0x01, 0x02, 0x03, 0x09],
    );
    assert_eq!(Wrapper::MIN_BYTE_COUNT, 4);
}

#[test]
fn fixed_arrays_inline_their_elements() {
    let arrays = Arrays {
        raw: [1, 2, 3, 4],
        words: [0x0506, 0x0708],
    };
    test_write(&arrays, Endian::Big, &[1, 2, 3, 4, 5, 6, 7, 8]);
    test_write(&arrays, Endian::Little, &[1, 2, 3, 4, 6, 5, 8, 7]);
    test_read(Endian::Big, &[1, 2, 3, 4, 5, 6, 7, 8], arrays);
}

#[test]
fn boxed_slices_use_literal_counts() {
    test_bidir(
        Slices {
            bytes: vec![7, 8, 9].into_boxed_slice(),
        },
        Endian::Big,
        &[7, 8, 9],
    );
    let wrong = Slices {
        bytes: vec![7, 8].into_boxed_slice(),
    };
    assert!(wrong.to_vec(Endian::Big).is_err());
}

#[test]
fn deques_round_trip_like_vectors() {
    test_bidir(
        Ring {
            marker: 0x01,
            rest: vec![0x0203, 0x0405].into_iter().collect(),
        },
        Endian::Little,
        &[0x01, 0x03, 0x02, 0x05, 0x04],
    );
}

#[test]
fn ignored_fields_are_skipped_and_defaulted() {
    let value = Cached {
        value: 0x0007,
        checksum: 12345,
    };
    test_write(&value, Endian::Little, &[0x07, 0x00]);
    test_read(
        Endian::Little,
        &[0x07, 0x00],
        Cached {
            value: 0x0007,
            checksum: 0,
        },
    );
}

#[test]
fn byte_length_keeps_the_low_order_bytes() {
    let value = Truncated {
        value: 0x0012_3456,
        trailer: 0xaa,
    };
    test_bidir(value, Endian::Little, &[0x56, 0x34, 0x12, 0xaa]);
    test_bidir(
        Truncated {
            value: 0x0012_3456,
            trailer: 0xaa,
        },
        Endian::Big,
        &[0x12, 0x34, 0x56, 0xaa],
    );
}

#[test]
fn byte_length_truncates_high_bytes_silently() {
    let value = Truncated {
        value: 0xff12_3456,
        trailer: 0x00,
    };
    let bytes = value.to_vec(Endian::Little).unwrap();
    assert_eq!(bytes, &[0x56, 0x34, 0x12, 0x00]);
}

#[test]
fn enums_encode_their_declared_ids() {
    test_bidir(Opcode::Read, Endian::Big, &[0x01]);
    test_bidir(Opcode::Write, Endian::Big, &[0x02]);
    test_bidir(Opcode::Halt, Endian::Big, &[0xff]);
}

#[test]
fn unknown_enum_discriminants_are_rejected() {
    assert!(Opcode::read_bytes(Endian::Big, &[0x03]).is_err());
}

#[test]
fn nested_collections_use_member_counts() {
    test_bidir(
        HeaderList {
            count: 2,
            headers: vec![
                Header {
                    kind: 1,
                    size: 0x0002,
                },
                Header {
                    kind: 3,
                    size: 0x0004,
                },
            ],
        },
        Endian::Big,
        &[0x02, 0x01, 0x00, 0x02, 0x03, 0x00, 0x04],
    );
}

#[test]
fn endian_wrappers_pin_the_byte_order() {
    let value = MixedOrder {
        le: 0x0102.into(),
        be: 0x0304.into(),
    };
    test_write(&value, Endian::Big, &[0x02, 0x01, 0x03, 0x04]);
    test_write(&value, Endian::Little, &[0x02, 0x01, 0x03, 0x04]);
    test_read(Endian::Big, &[0x02, 0x01, 0x03, 0x04], value);
}

#[test]
fn magic_prefixes_are_verified() {
    test_bidir(
        MagicFile {
            magic: Magic,
            version: 2,
        },
        Endian::Big,
        b"BOBJ\x02",
    );
    assert!(MagicFile::read_bytes(Endian::Big, b"XOBJ\x02").is_err());
}

#[test]
fn short_write_buffers_leave_no_partial_output() {
    let header = Header {
        kind: 0x01,
        size: 0x0203,
    };
    let mut buf = [0u8; 2];
    assert!(header.write_bytes(Endian::Big, &mut buf).is_err());
    assert_eq!(buf, [0, 0]);
}

#[test]
fn short_read_buffers_report_before_consuming() {
    assert!(Header::read_bytes(Endian::Big, &[0x01, 0x02]).is_err());
    assert!(Wrapper::read_bytes(Endian::Big, &[0x01, 0x02, 0x03]).is_err());
}
