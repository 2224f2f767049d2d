//! Benchmarks for editing through the sync core.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use marknote::commands::FormatCommand;
use marknote::session::{NoteSession, SessionOptions};
use marknote::storage::MemoryStore;
use marknote::sync::SurfaceId;

fn mounted_session() -> NoteSession<MemoryStore> {
    let mut session = NoteSession::open(MemoryStore::new(), SessionOptions::default());
    session.editor_ref(Some(SurfaceId(1)));
    session
}

fn bench_typing(c: &mut Criterion) {
    c.bench_function("type_line", |b| {
        b.iter_batched(
            mounted_session,
            |mut session| {
                for ch in black_box("A line typed into the note.").chars() {
                    session.edit(|ed| ed.insert_char(ch));
                }
                session
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_format_commands(c: &mut Criterion) {
    let commands = [
        FormatCommand::Bold,
        FormatCommand::Quote,
        FormatCommand::BulletList,
        FormatCommand::Link { url: None },
    ];
    c.bench_function("format_commands", |b| {
        b.iter_batched(
            mounted_session,
            |mut session| {
                session.edit(|ed| ed.select_all());
                for cmd in &commands {
                    session.format(black_box(cmd));
                }
                session
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_typing, bench_format_commands);
criterion_main!(benches);
