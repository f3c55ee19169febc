//! 페이지 파싱 + 정규화 + 필터 처리량 벤치마크
//!
//! One portal page of 100 leads, keyed by id the way the search endpoint
//! returns them, run through boundary parsing, normalization and the
//! incremental filter, plus planning and labelling of two years of windows.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::{Map, Value, json};

use chrono::NaiveDate;
use lead_sync_lib::domain::{NormalizedRecord, SyncBatch, SyncMode, Watermark, plan_windows};
use lead_sync_lib::infrastructure::parse_lead_page;

const LEADS_PER_PAGE: usize = 100;

fn page_body() -> Vec<u8> {
    let data: Map<String, Value> = (0..LEADS_PER_PAGE)
        .map(|i| {
            let record = json!({
                "first_name": format!("  Lead {i}  "),
                "contact": format!("98{i:08}"),
                "lead_source": "Website",
                "lead_sub_source": null,
                "lead_stage": { "id": i % 5, "label": "Visit" },
                "lead_number": 10_000 + i,
                "created_at": format!("2024-01-{:02} {:02}:00:00", i % 28 + 1, i % 24),
                "updated_at": "2024-02-01 00:00:00",
                "recent_date": "",
            });
            ((50_000 + i).to_string(), record)
        })
        .collect();
    serde_json::to_vec(&json!({
        "data": data,
        "next_page_url": "https://portal.example.com/leadList?page=2",
    }))
    .unwrap_or_default()
}

fn bench_page_processing(c: &mut Criterion) {
    let body = page_body();
    let mode = SyncMode::from_watermark(Watermark::parse("2024-01-14 00:00:00").unwrap());

    let mut group = c.benchmark_group("lead_page");
    group.throughput(Throughput::Elements(LEADS_PER_PAGE as u64));

    group.bench_function("parse", |b| {
        b.iter(|| parse_lead_page(black_box(&body)).unwrap());
    });

    let page = parse_lead_page(&body).unwrap();
    group.bench_function("normalize_and_filter", |b| {
        b.iter(|| {
            let batch: SyncBatch = black_box(&page.records)
                .iter()
                .map(NormalizedRecord::from_raw)
                .filter(|record| mode.includes(&record.created_at))
                .collect();
            batch.next_watermark(&mode.watermark())
        });
    });

    group.finish();
}

fn bench_window_planning(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap_or_default();
    c.bench_function("plan_windows_24_months", |b| {
        b.iter(|| {
            plan_windows(black_box(today), 24)
                .iter()
                .map(|window| window.filter_label())
                .collect::<Vec<_>>()
        });
    });
}

criterion_group!(benches, bench_page_processing, bench_window_planning);
criterion_main!(benches);
