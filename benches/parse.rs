use criterion::{black_box, criterion_group, criterion_main, Criterion};

use toolstream_rs::config::{ParserOptions, ToolsetConfig};
use toolstream_rs::parser::StreamingToolParser;
use toolstream_rs::schema::ToolSchema;

fn bench_schema() -> ToolSchema {
    let toolset = ToolsetConfig::from_pairs(&[
        ("read_file", &["path", "start_line", "end_line"][..]),
        ("write_to_file", &["path", "content"][..]),
        ("attempt_completion", &["result"][..]),
    ]);
    ToolSchema::new(&toolset).expect("bench toolset")
}

fn plain_text_payload(total_bytes: usize) -> String {
    let sentence = "The quick brown fox jumps over the lazy dog. ";
    let mut out = String::with_capacity(total_bytes + sentence.len());
    while out.len() < total_bytes {
        out.push_str(sentence);
    }
    out
}

fn tool_payload(invocations: usize) -> String {
    let mut out = String::new();
    for idx in 0..invocations {
        out.push_str("Considering the next step.\n");
        out.push_str("<read_file><path>src/file_");
        out.push_str(&idx.to_string());
        out.push_str(".rs</path><start_line>1</start_line><end_line>200</end_line></read_file>\n");
    }
    out
}

fn new_parser(schema: &ToolSchema) -> StreamingToolParser {
    let mut parser = StreamingToolParser::new(schema.clone(), ParserOptions::default());
    parser.on_block(|block| {
        black_box(&block);
    });
    parser
}

fn bench_plain_text_passthrough(c: &mut Criterion) {
    let schema = bench_schema();
    let payload = plain_text_payload(64 * 1024);

    c.bench_function("plain_text_64k_single_chunk", |b| {
        b.iter(|| {
            let mut parser = new_parser(&schema);
            parser.process_chunk(black_box(payload.as_str()));
            parser.finalize();
        });
    });
}

fn bench_tool_invocations(c: &mut Criterion) {
    let schema = bench_schema();
    let payload = tool_payload(64);

    c.bench_function("tool_invocations_x64", |b| {
        b.iter(|| {
            let mut parser = new_parser(&schema);
            parser.process_chunk(black_box(payload.as_str()));
            parser.finalize();
        });
    });
}

fn bench_fine_grained_chunks(c: &mut Criterion) {
    let schema = bench_schema();
    let payload = tool_payload(16);
    let chunks: Vec<&str> = payload
        .as_bytes()
        .chunks(16)
        .map(|chunk| std::str::from_utf8(chunk).expect("ascii payload"))
        .collect();

    c.bench_function("tool_invocations_16b_chunks", |b| {
        b.iter(|| {
            let mut parser = new_parser(&schema);
            for chunk in &chunks {
                parser.process_chunk(black_box(chunk));
            }
            parser.finalize();
        });
    });
}

criterion_group!(
    benches,
    bench_plain_text_passthrough,
    bench_tool_invocations,
    bench_fine_grained_chunks
);
criterion_main!(benches);
