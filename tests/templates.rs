// End-to-end template runs against in-memory streams

use pretty_assertions::assert_eq;

use template_lang::{
    Endianness, Entry, EntryValue, ErrorKind, SliceStream, TemplateEngine, VmState,
};

fn run(source: &str, data: &[u8]) -> Vec<Entry> {
    let mut engine = TemplateEngine::new();
    let mut stream = SliceStream::new(data);
    engine
        .run(source, &mut stream)
        .unwrap_or_else(|e| panic!("run failed: {}", e))
}

fn run_output(source: &str, data: &[u8]) -> String {
    let mut engine = TemplateEngine::new();
    let mut stream = SliceStream::new(data);
    engine
        .run(source, &mut stream)
        .unwrap_or_else(|e| panic!("run failed: {}", e));
    engine.output()
}

/// Run a template expected to fail interpretation; returns the error kind
/// and the (empty) forest.
fn run_expecting_error(source: &str, data: &[u8]) -> (ErrorKind, Vec<Entry>) {
    let mut engine = TemplateEngine::new();
    let mut stream = SliceStream::new(data);
    engine.parse(source).expect("parse failed");
    let err = engine.read_io(&mut stream).expect_err("run should fail");
    assert_eq!(engine.state(), VmState::Error);
    let forest = engine.create_template();
    (err.kind, forest)
}

// ========== Spec scenarios ==========

#[test]
fn s1_magic_and_size() {
    let forest = run(
        "char magic[4]; uint32 size;",
        &[0x50, 0x4B, 0x03, 0x04, 0x2A, 0x00, 0x00, 0x00],
    );
    assert_eq!(forest.len(), 2);

    assert_eq!(forest[0].name, "magic");
    assert_eq!(forest[0].offset, 0);
    assert_eq!(forest[0].size, 4);
    assert_eq!(forest[0].value, EntryValue::Str("PK\x03\x04".to_string()));

    assert_eq!(forest[1].name, "size");
    assert_eq!(forest[1].offset, 4);
    assert_eq!(forest[1].size, 4);
    assert_eq!(forest[1].value, EntryValue::Unsigned(42));
}

#[test]
fn s2_endianness_switch() {
    let forest = run(
        "BigEndian(); ushort a; LittleEndian(); ushort b;",
        &[0x00, 0x01, 0x00, 0x01],
    );
    assert_eq!(forest[0].value, EntryValue::Unsigned(1));
    assert_eq!(forest[0].endian, Endianness::Big);
    assert_eq!(forest[1].value, EntryValue::Unsigned(256));
    assert_eq!(forest[1].endian, Endianness::Little);
}

#[test]
fn s3_fseek_past_end_fails_cursor_unchanged() {
    let output = run_output(
        "local int n = FTell();\n\
         local int f = FSeek(100);\n\
         local int r = FSeek(10000000);\n\
         local int t = FTell();\n\
         Printf(\"%d %d %d %d\", n, f, r, t);",
        &[0u8; 8],
    );
    assert_eq!(output, "0 -1 -1 0");
}

#[test]
fn s4_struct_array() {
    let forest = run(
        "struct P { uchar x; uchar y; } p[3];",
        &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06],
    );
    assert_eq!(forest.len(), 1);
    let p = &forest[0];
    assert_eq!(p.size, 6);
    assert_eq!(p.value, EntryValue::Array);
    assert_eq!(p.children.len(), 3);
    for child in &p.children {
        assert_eq!(child.size, 2);
        assert_eq!(child.value, EntryValue::Struct);
    }
    // p[1].y
    assert_eq!(p.children[1].children[1].name, "y");
    assert_eq!(p.children[1].children[1].value, EntryValue::Unsigned(4));
}

#[test]
fn s5_division_by_zero_empties_template() {
    let (kind, forest) = run_expecting_error("local int x = 10/0;", &[0u8; 4]);
    assert_eq!(kind, ErrorKind::Arithmetic);
    assert!(forest.is_empty());
}

#[test]
fn s6_printf_and_format_mismatch() {
    let output = run_output("Printf(\"%d %s\", 7, \"hi\");", &[]);
    assert_eq!(output, "7 hi");

    let (kind, _) = run_expecting_error("Printf(\"%d\", \"hi\");", &[]);
    assert_eq!(kind, ErrorKind::Format);
}

// ========== Declarations and types ==========

#[test]
fn test_primitive_aliases() {
    let forest = run(
        "BYTE a; WORD w; DWORD d; QWORD q;",
        &[
            0x01, // a
            0x02, 0x00, // w
            0x03, 0x00, 0x00, 0x00, // d
            0x04, 0, 0, 0, 0, 0, 0, 0, // q
        ],
    );
    assert_eq!(forest[0].value, EntryValue::Signed(1));
    assert_eq!(forest[1].value, EntryValue::Unsigned(2));
    assert_eq!(forest[2].value, EntryValue::Unsigned(3));
    assert_eq!(forest[3].value, EntryValue::Unsigned(4));
}

#[test]
fn test_signed_read_sign_extends() {
    let forest = run("char c; short s;", &[0xFF, 0xFE, 0xFF]);
    assert_eq!(forest[0].value, EntryValue::Signed(-1));
    assert_eq!(forest[1].value, EntryValue::Signed(-2));
}

#[test]
fn test_float_read() {
    let mut data = Vec::new();
    data.extend_from_slice(&1.5f32.to_le_bytes());
    data.extend_from_slice(&2.25f64.to_le_bytes());
    let forest = run("float f; double d;", &data);
    assert_eq!(forest[0].value, EntryValue::Float(1.5));
    assert_eq!(forest[1].value, EntryValue::Float(2.25));
}

#[test]
fn test_typedef_and_typedef_array() {
    let forest = run(
        "typedef uint Handle; typedef char ID[4]; Handle h; ID tag;",
        &[0x2A, 0x00, 0x00, 0x00, b'W', b'A', b'V', b'E'],
    );
    assert_eq!(forest[0].type_name, "Handle");
    assert_eq!(forest[0].value, EntryValue::Unsigned(42));
    assert_eq!(forest[1].type_name, "ID");
    assert_eq!(forest[1].value, EntryValue::Str("WAVE".to_string()));
    assert_eq!(forest[1].size, 4);
}

#[test]
fn test_string_file_type_reads_to_nul() {
    let forest = run("string name; uchar next;", b"hi\0\x07");
    assert_eq!(forest[0].value, EntryValue::Str("hi".to_string()));
    assert_eq!(forest[0].size, 3);
    assert_eq!(forest[1].offset, 3);
    assert_eq!(forest[1].value, EntryValue::Unsigned(7));
}

#[test]
fn test_field_visible_to_later_fields() {
    // The length prefix drives the size of the following array.
    let forest = run(
        "struct Blob { uchar len; uchar data[len]; } b;",
        &[0x03, 0xAA, 0xBB, 0xCC, 0xDD],
    );
    let b = &forest[0];
    assert_eq!(b.size, 4);
    assert_eq!(b.children[1].children.len(), 3);
    assert_eq!(b.children[1].children[2].value, EntryValue::Unsigned(0xCC));
}

#[test]
fn test_nested_structs() {
    let forest = run(
        "struct Inner { ushort v; }; struct Outer { Inner a; Inner b; } o;",
        &[0x01, 0x00, 0x02, 0x00],
    );
    let o = &forest[0];
    assert_eq!(o.size, 4);
    assert_eq!(o.children[0].children[0].value, EntryValue::Unsigned(1));
    assert_eq!(o.children[1].children[0].value, EntryValue::Unsigned(2));
    assert_eq!(o.children[1].offset, 2);
}

#[test]
fn test_anonymous_struct_with_declarator() {
    let forest = run("struct { uchar a; } anon;", &[0x09]);
    assert_eq!(forest[0].name, "anon");
    assert_eq!(forest[0].children[0].value, EntryValue::Unsigned(9));
}

#[test]
fn test_union_reports_largest_member() {
    let forest = run(
        "union U { ushort h; uchar b; } u; uchar after;",
        &[0xAB, 0xCD, 0x11],
    );
    let u = &forest[0];
    assert_eq!(u.value, EntryValue::Union);
    assert_eq!(u.size, 2);
    // Both members decode from the union's start.
    assert_eq!(u.children[0].offset, 0);
    assert_eq!(u.children[0].value, EntryValue::Unsigned(0xCDAB));
    assert_eq!(u.children[1].offset, 0);
    assert_eq!(u.children[1].value, EntryValue::Unsigned(0xAB));
    // The cursor lands after the widest member.
    assert_eq!(forest[1].offset, 2);
    assert_eq!(forest[1].value, EntryValue::Unsigned(0x11));
}

#[test]
fn test_enum_with_underlying_type() {
    let forest = run(
        "enum <ushort> Kind { A = 1, B = 5, C }; Kind k; Kind j;",
        &[0x05, 0x00, 0x09, 0x00],
    );
    assert_eq!(forest[0].size, 2);
    assert_eq!(
        forest[0].value,
        EntryValue::Enum {
            value: 5,
            variant: Some("B".to_string())
        }
    );
    // 9 matches no member; the raw value is kept with no variant name.
    assert_eq!(
        forest[1].value,
        EntryValue::Enum {
            value: 9,
            variant: None
        }
    );
}

#[test]
fn test_enum_members_are_constants() {
    let output = run_output(
        "enum Color { Red, Green = 10, Blue }; Printf(\"%d %d %d\", Red, Green, Blue);",
        &[],
    );
    assert_eq!(output, "0 10 11");
}

#[test]
fn test_bitfields_little_endian() {
    let forest = run(
        "struct F { uchar lo : 4; uchar hi : 4; } f;",
        &[0xB3],
    );
    let f = &forest[0];
    assert_eq!(f.size, 1);
    assert_eq!(f.children[0].value, EntryValue::Unsigned(0x3));
    assert_eq!(f.children[1].value, EntryValue::Unsigned(0xB));
}

#[test]
fn test_bitfields_big_endian_bit_order() {
    let forest = run(
        "BigEndian(); struct F { uchar lo : 4; uchar hi : 4; } f;",
        &[0xB3],
    );
    let f = &forest[0];
    assert_eq!(f.children[0].value, EntryValue::Unsigned(0xB));
    assert_eq!(f.children[1].value, EntryValue::Unsigned(0x3));
}

#[test]
fn test_signed_bitfield_sign_extends() {
    // raw 0xAB: a = bits 0..3 = 3, b = bits 3..8 = 0b10101 = -11 as 5-bit
    let forest = run(
        "struct G { int a : 3; int b : 5; uchar tail; } g;",
        &[0xAB, 0x00, 0x00, 0x00, 0x7F],
    );
    let g = &forest[0];
    assert_eq!(g.children[0].value, EntryValue::Signed(3));
    assert_eq!(g.children[1].value, EntryValue::Signed(-11));
    // The two fields share one 4-byte unit; tail follows it.
    assert_eq!(g.children[2].offset, 4);
    assert_eq!(g.size, 5);
}

#[test]
fn test_array_of_uchar_is_element_list() {
    let forest = run("uchar data[3];", &[1, 2, 3]);
    assert_eq!(forest[0].value, EntryValue::Array);
    assert_eq!(forest[0].children.len(), 3);
    assert_eq!(forest[0].children[0].name, "[0]");
}

// ========== Expressions and control flow ==========

#[test]
fn test_switch_fallthrough() {
    let output = run_output(
        "local int x = 2; local int r = 0;\n\
         switch (x) {\n\
           case 1: r = 10; break;\n\
           case 2: r = 20;\n\
           case 3: r = r + 1; break;\n\
           default: r = 99;\n\
         }\n\
         Printf(\"%d\", r);",
        &[],
    );
    assert_eq!(output, "21");
}

#[test]
fn test_switch_default() {
    let output = run_output(
        "local int x = 7; local int r = 0;\n\
         switch (x) { case 1: r = 1; break; default: r = 42; }\n\
         Printf(\"%d\", r);",
        &[],
    );
    assert_eq!(output, "42");
}

#[test]
fn test_do_while() {
    let output = run_output(
        "local int i = 0; do { i = i + 1; } while (i < 3); Printf(\"%d\", i);",
        &[],
    );
    assert_eq!(output, "3");
}

#[test]
fn test_for_loop_with_continue_and_break() {
    let output = run_output(
        "local int sum = 0;\n\
         for (local int i = 0; i < 10; i = i + 1) {\n\
           if (i % 2 == 1) continue;\n\
           if (i == 8) break;\n\
           sum = sum + i;\n\
         }\n\
         Printf(\"%d\", sum);",
        &[],
    );
    assert_eq!(output, "12"); // 0 + 2 + 4 + 6
}

#[test]
fn test_while_reads_until_eof() {
    let output = run_output(
        "local int count = 0; while (!FEof()) { uchar b; count = count + 1; } Printf(\"%d\", count);",
        &[9, 9, 9],
    );
    assert_eq!(output, "3");
}

#[test]
fn test_user_function() {
    let output = run_output(
        "int Sum(int a, int b) { return a + b; } Printf(\"%d\", Sum(2, 3));",
        &[],
    );
    assert_eq!(output, "5");
}

#[test]
fn test_recursive_function() {
    let output = run_output(
        "int Fact(int n) { if (n <= 1) return 1; return n * Fact(n - 1); } Printf(\"%d\", Fact(5));",
        &[],
    );
    assert_eq!(output, "120");
}

#[test]
fn test_void_function_side_effect() {
    let output = run_output(
        "void Hello(int n) { Printf(\"hi %d\", n); } Hello(3);",
        &[],
    );
    assert_eq!(output, "hi 3");
}

// ========== Built-ins ==========

#[test]
fn test_read_scalar_does_not_move_cursor() {
    let output = run_output(
        "local int v = ReadUShort(2); local int t = FTell(); Printf(\"%d %d\", v, t);",
        &[0, 0, 0x2A, 0x00],
    );
    assert_eq!(output, "42 0");
}

#[test]
fn test_read_scalar_at_cursor() {
    let output = run_output(
        "uchar skip; Printf(\"%d %d\", ReadUInt(), FTell());",
        &[0x01, 0x05, 0x00, 0x00, 0x00],
    );
    assert_eq!(output, "5 1");
}

#[test]
fn test_read_string_and_strlen() {
    let output = run_output(
        "local string s = ReadString(2);\n\
         Printf(\"%s %d %d\", s, Strlen(s), FTell());",
        b"ABCD\0EF",
    );
    assert_eq!(output, "CD 2 0");
}

#[test]
fn test_read_string_with_maxlen() {
    let output = run_output(
        "Printf(\"%s\", ReadString(0, 3));",
        b"ABCDEF",
    );
    assert_eq!(output, "ABC");
}

#[test]
fn test_read_bytes_fills_buffer() {
    let output = run_output(
        "local uchar buf[2]; ReadBytes(buf, 1, 2); Printf(\"%d %d %d\", buf[0], buf[1], FTell());",
        &[10, 20, 30],
    );
    assert_eq!(output, "20 30 0");
}

#[test]
fn test_file_size_and_feof() {
    let output = run_output(
        "Printf(\"%d %d\", FileSize(), FEof());",
        &[0, 0, 0],
    );
    assert_eq!(output, "3 0");
}

#[test]
fn test_ceil() {
    let output = run_output("Printf(\"%g\", Ceil(2.1));", &[]);
    assert_eq!(output, "3");
}

#[test]
fn test_warning_prefixes_output() {
    let output = run_output("Warning(\"bad %d\", 7);", &[]);
    assert_eq!(output, "WARNING: bad 7");
}

#[test]
fn test_find_all_stub_prints_notice() {
    let output = run_output("FindAll(1, 2);", &[]);
    assert_eq!(output, "FindAll(): not implemented\n");
}

#[test]
fn test_template_test_harness() {
    let output = run_output("__template_test__(1 == 1); __template_test__(0);", &[]);
    assert_eq!(output, "OK\nFAIL\n");
}

// ========== Colors ==========

#[test]
fn test_colors_recorded_on_entries() {
    let forest = run(
        "SetBackColor(cRed); uchar a; SetBackColor(cNone); uchar b; SetBackColor(cNotAColor); uchar c;",
        &[1, 2, 3],
    );
    assert_eq!(forest[0].bg_color, Some(0x0000_00FF));
    assert_eq!(forest[1].bg_color, Some(0xFFFF_FFFF));
    assert_eq!(forest[2].bg_color, None);
}

#[test]
fn test_color_scoped_to_struct_body() {
    let forest = run(
        "SetBackColor(cRed);\n\
         struct S { SetBackColor(cGreen); uchar a; } s;\n\
         uchar z;",
        &[1, 2],
    );
    assert_eq!(forest[0].children[0].bg_color, Some(0x0000_FF00));
    assert_eq!(forest[1].bg_color, Some(0x0000_00FF));
}

#[test]
fn test_fore_color() {
    let forest = run("SetForeColor(cWhite); uchar a;", &[1]);
    assert_eq!(forest[0].fg_color, Some(0x00FF_FFFF));
}

// ========== Errors ==========

#[test]
fn test_short_read_is_eof_error() {
    let (kind, forest) = run_expecting_error("uint32 big;", &[0x01, 0x02]);
    assert_eq!(kind, ErrorKind::Eof);
    assert!(forest.is_empty());
}

#[test]
fn test_undefined_variable() {
    let (kind, _) = run_expecting_error("local int x = nope;", &[]);
    assert_eq!(kind, ErrorKind::UndefinedName);
}

#[test]
fn test_undefined_type() {
    let (kind, _) = run_expecting_error("Mystery m;", &[0u8; 8]);
    assert_eq!(kind, ErrorKind::UndefinedName);
}

#[test]
fn test_redeclaration_in_same_scope() {
    let (kind, _) = run_expecting_error("local int x = 1; local int x = 2;", &[]);
    assert_eq!(kind, ErrorKind::Redeclaration);
}

#[test]
fn test_shadowing_in_inner_scope_allowed() {
    let output = run_output(
        "local int x = 1; if (1) { local int x = 2; Printf(\"%d \", x); } Printf(\"%d\", x);",
        &[],
    );
    assert_eq!(output, "2 1");
}

#[test]
fn test_variable_colliding_with_type_name() {
    let (kind, _) = run_expecting_error("local int int = 1;", &[]);
    assert_eq!(kind, ErrorKind::Redeclaration);
}

#[test]
fn test_const_rejects_assignment() {
    let (kind, _) = run_expecting_error("const int K = 5; K = 6;", &[]);
    assert_eq!(kind, ErrorKind::Type);
}

#[test]
fn test_index_out_of_bounds() {
    let (kind, _) = run_expecting_error("local uchar buf[2]; local int x = buf[5];", &[]);
    assert_eq!(kind, ErrorKind::Index);
}

#[test]
fn test_cast_overflow_is_arithmetic_error() {
    let (kind, _) = run_expecting_error("local int x = (uchar)300;", &[]);
    assert_eq!(kind, ErrorKind::Arithmetic);
}

#[test]
fn test_arity_error() {
    let (kind, _) = run_expecting_error("LittleEndian(1);", &[]);
    assert_eq!(kind, ErrorKind::Arity);
}

#[test]
fn test_color_requires_identifier() {
    let (kind, _) = run_expecting_error("SetBackColor(1 + 2);", &[]);
    assert_eq!(kind, ErrorKind::Type);
}

#[test]
fn test_error_carries_stream_offset() {
    let mut engine = TemplateEngine::new();
    let mut stream = SliceStream::new(&[0u8; 2]);
    engine.parse("uchar a; uint32 big;").expect("parse failed");
    let err = engine.read_io(&mut stream).expect_err("run should fail");
    assert_eq!(err.kind, ErrorKind::Eof);
    assert_eq!(err.offset, Some(1));
}

// ========== Engine surface ==========

#[test]
fn test_parse_accumulates_across_calls() {
    let mut engine = TemplateEngine::new();
    engine.parse("uchar a;").expect("first parse failed");
    engine.parse("uchar b;").expect("second parse failed");
    let mut stream = SliceStream::new(&[1, 2]);
    engine.read_io(&mut stream).expect("run failed");
    let forest = engine.create_template();
    assert_eq!(forest.len(), 2);
    assert_eq!(forest[1].name, "b");
}

#[test]
fn test_read_io_rebinds_stream_and_resets_ledger() {
    let mut engine = TemplateEngine::new();
    engine.parse("uchar a;").expect("parse failed");

    let mut first = SliceStream::new(&[1]);
    engine.read_io(&mut first).expect("first run failed");
    assert_eq!(engine.create_template()[0].value, EntryValue::Unsigned(1));

    let mut second = SliceStream::new(&[9]);
    engine.read_io(&mut second).expect("second run failed");
    let forest = engine.create_template();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].value, EntryValue::Unsigned(9));
}

#[test]
fn test_parse_error_parks_engine_in_error_state() {
    let mut engine = TemplateEngine::new();
    assert!(engine.parse("struct {").is_err());
    assert_eq!(engine.state(), VmState::Error);
    let err = engine.last_error().expect("no recorded error");
    assert_eq!(err.kind, ErrorKind::Syntax);
}

#[test]
fn test_entry_hook_sees_children_first() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let mut engine = TemplateEngine::new();
    engine.set_entry_hook(move |entry: &Entry| {
        sink.borrow_mut().push(entry.name.clone());
    });
    let mut stream = SliceStream::new(&[1, 2]);
    engine
        .run("struct P { uchar x; uchar y; } p;", &mut stream)
        .expect("run failed");

    assert_eq!(*seen.borrow(), vec!["x", "y", "p"]);
}

#[test]
fn test_print_hook_receives_chunks() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let captured = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&captured);

    let mut engine = TemplateEngine::new();
    engine.set_print_hook(move |chunk: &str| {
        sink.borrow_mut().push_str(chunk);
    });
    let mut stream = SliceStream::new(&[]);
    engine.run("Printf(\"a\"); Printf(\"b\");", &mut stream).expect("run failed");

    assert_eq!(*captured.borrow(), "ab");
}

// ========== Layout invariants ==========

#[test]
fn test_ledger_preserves_declaration_order() {
    let forest = run("uchar a; uchar b; uchar c;", &[1, 2, 3]);
    let names: Vec<&str> = forest.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_stream_values_within_bounds() {
    let forest = run(
        "struct P { ushort a; uchar b; } p[2]; uchar tail;",
        &[1, 0, 2, 3, 0, 4, 5],
    );
    let size = 7u64;
    fn check(entry: &Entry, size: u64) {
        assert!(entry.offset + entry.size <= size, "entry {} out of bounds", entry.name);
        for child in &entry.children {
            check(child, size);
        }
    }
    for entry in &forest {
        check(entry, size);
    }
}

#[test]
fn test_pure_struct_size_is_sum_of_fields() {
    let forest = run(
        "struct H { uint32 a; ushort b; uchar c; } h;",
        &[0u8; 7],
    );
    let h = &forest[0];
    let sum: u64 = h.children.iter().map(|c| c.size).sum();
    assert_eq!(h.size, sum);
    assert_eq!(h.size, 7);
}

#[test]
fn test_backward_seek_in_struct_body_yields_empty_span() {
    // A body that only seeks backward never reaches past its own start.
    let forest = run("uchar z; struct S { FSeek(0); } s;", &[0x07, 0x08]);
    assert_eq!(forest[1].name, "s");
    assert_eq!(forest[1].offset, 1);
    assert_eq!(forest[1].size, 0);
}

#[test]
fn test_backward_seek_after_read_keeps_max_span() {
    let forest = run(
        "struct T { ushort a; FSeek(0); } t; uchar first;",
        &[0x01, 0x00, 0xFF],
    );
    // The span covers the bytes the member read, not the rewound cursor.
    assert_eq!(forest[0].size, 2);
    // The next declaration really does read from the rewound position.
    assert_eq!(forest[1].offset, 0);
    assert_eq!(forest[1].value, EntryValue::Unsigned(1));
}

#[test]
fn test_backward_seek_in_array_element_body() {
    let forest = run(
        "uchar pad; struct E { FSeek(0); uchar v; } e[1];",
        &[0x2A, 0x00],
    );
    let e = &forest[1];
    assert_eq!(e.offset, 1);
    assert_eq!(e.size, 0);
    assert_eq!(e.children[0].children[0].value, EntryValue::Unsigned(42));
}

#[test]
fn test_alias_param_coerces_like_primitive() {
    let output = run_output(
        "typedef uchar Flag; void Show(Flag f) { Printf(\"%d\", f); } Show(300);",
        &[],
    );
    assert_eq!(output, "44");
}

#[test]
fn test_alias_return_type_coerces() {
    let output = run_output(
        "typedef uchar Small; Small Clip(int v) { return v; } Printf(\"%d\", Clip(300));",
        &[],
    );
    assert_eq!(output, "44");
}

#[test]
fn test_explicit_seek_within_struct_spans_cursor_range() {
    // FSeek inside a struct body: size spans start to final cursor.
    let forest = run(
        "struct S { uchar a; FSeek(4); uchar b; } s;",
        &[1, 0, 0, 0, 9, 0],
    );
    let s = &forest[0];
    assert_eq!(s.children[1].offset, 4);
    assert_eq!(s.children[1].value, EntryValue::Unsigned(9));
    assert_eq!(s.size, 5);
}
