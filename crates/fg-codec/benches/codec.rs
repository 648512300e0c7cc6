use fg_codec::{compress, compress_with, decompress, Scheme};

fn make_report(size: usize) -> String {
    // Report-like text: repeated lines with runs of padding
    let line = "Beam B-12    load 45kN    status OK\n";
    line.repeat(size / line.len() + 1)[..size].to_string()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn zstd_compress(bencher: divan::Bencher, size: usize) {
    let text = make_report(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| compress(divan::black_box(&text)));
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn zstd_decompress(bencher: divan::Bencher, size: usize) {
    let encoded = compress(&make_report(size));
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| decompress(divan::black_box(&encoded)).unwrap());
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn run_length_compress(bencher: divan::Bencher, size: usize) {
    let text = make_report(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| compress_with(divan::black_box(&text), Scheme::RunLength).unwrap());
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn run_length_decompress(bencher: divan::Bencher, size: usize) {
    let encoded = compress_with(&make_report(size), Scheme::RunLength).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| decompress(divan::black_box(&encoded)).unwrap());
}

fn main() {
    divan::main();
}
