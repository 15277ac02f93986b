//! Snapshot tests over the raw SAX event stream, grounded on the
//! teacher's `tests/snapshots_values.rs` (`render_values` /
//! `insta::assert_snapshot!`) pattern, adapted to this crate's `Handler`
//! callbacks instead of its `ParseEvent` enum.

use core::fmt::Write as _;

use jsonic::sax::{Handler, Parser, ParserOptions};

#[derive(Default)]
struct Recorder {
    out: String,
}

impl Handler for Recorder {
    fn on_object_begin(&mut self) -> bool {
        self.out.push_str("obj_begin\n");
        true
    }
    fn on_object_end(&mut self, size: usize) -> bool {
        writeln!(self.out, "obj_end size={size}").unwrap();
        true
    }
    fn on_array_begin(&mut self) -> bool {
        self.out.push_str("arr_begin\n");
        true
    }
    fn on_array_end(&mut self, size: usize) -> bool {
        writeln!(self.out, "arr_end size={size}").unwrap();
        true
    }
    fn on_key_part(&mut self, chunk: &[u8], total_so_far: usize) -> bool {
        writeln!(self.out, "key_part {:?} total={total_so_far}", String::from_utf8_lossy(chunk)).unwrap();
        true
    }
    fn on_key(&mut self, chunk: &[u8], total: usize) -> bool {
        writeln!(self.out, "key {:?} total={total}", String::from_utf8_lossy(chunk)).unwrap();
        true
    }
    fn on_string_part(&mut self, chunk: &[u8], total_so_far: usize) -> bool {
        writeln!(self.out, "string_part {:?} total={total_so_far}", String::from_utf8_lossy(chunk)).unwrap();
        true
    }
    fn on_string(&mut self, chunk: &[u8], total: usize) -> bool {
        writeln!(self.out, "string {:?} total={total}", String::from_utf8_lossy(chunk)).unwrap();
        true
    }
    fn on_int64(&mut self, value: i64, _text: &[u8]) -> bool {
        writeln!(self.out, "int64 {value}").unwrap();
        true
    }
    fn on_uint64(&mut self, value: u64, _text: &[u8]) -> bool {
        writeln!(self.out, "uint64 {value}").unwrap();
        true
    }
    fn on_double(&mut self, value: f64, _text: &[u8]) -> bool {
        writeln!(self.out, "double {value}").unwrap();
        true
    }
    fn on_bool(&mut self, value: bool) -> bool {
        writeln!(self.out, "bool {value}").unwrap();
        true
    }
    fn on_null(&mut self) -> bool {
        self.out.push_str("null\n");
        true
    }
}

fn render(chunks: &[&[u8]]) -> String {
    let mut parser = Parser::new(ParserOptions::default());
    let mut rec = Recorder::default();
    let (last, init) = chunks.split_last().expect("at least one chunk");
    for chunk in init {
        parser.write_some(true, chunk, &mut rec).expect("chunk parses");
    }
    parser.finish(last, &mut rec).expect("document completes");
    rec.out
}

#[test]
fn nested_object_and_array_chunked_across_calls() {
    let rendered = render(&[br#"{"k":[1"#, br#",2,{"#, br#""x":"y"}],"#, br#""s":"he"#, br#"llo"}"#]);
    insta::assert_snapshot!(rendered, @r#"
    obj_begin
    key "k" total=1
    arr_begin
    int64 1
    int64 2
    obj_begin
    key "x" total=1
    string "y" total=1
    obj_end size=1
    arr_end size=3
    key "s" total=1
    string_part "he" total=2
    string "llo" total=5
    obj_end size=2
    "#);
}

#[test]
fn string_split_mid_escape_reports_parts_then_whole() {
    let rendered = render(&[br#""a\"#, br#"n"#, br#"b""#]);
    insta::assert_snapshot!(rendered, @r#"
    string_part "a" total=1
    string_part "\n" total=2
    string "b" total=3
    "#);
}

#[test]
fn surrogate_pair_split_across_chunks_decodes_to_one_string_event() {
    let rendered = render(&[br#""\uD83D"#, br#"\uDE00""#]);
    insta::assert_snapshot!(rendered, @r#"
    string "😀" total=4
    "#);
}
