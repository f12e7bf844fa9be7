mod test_support;

use serde_json::{json, Value};
use test_support::{spawn_sidecar, temp_dir, Seed, Sidecar};

/// Two classes. Encounter order is class name, then sort order: b, a, t1, z.
/// b and a tie on 170; t1 is absent in English; z is absent everywhere.
fn seeded() -> Sidecar {
    let workspace = temp_dir("scored-exam-reports");
    let mut sidecar = spawn_sidecar();
    sidecar.select_workspace(&workspace);

    let seed = Seed::open(&workspace);
    seed.grade("g1")
        .class("c1", "g1", "10-1")
        .class("c2", "g1", "10-2")
        .student("a", "c1", 1)
        .student("b", "c1", 0)
        .student("t1", "c2", 0)
        .student("z", "c2", 1)
        .subject("math", "Mathematics")
        .subject("eng", "English")
        .subject("pe", "Physical Education")
        .exam("e1", "g1")
        .exam_subject("e1", "math", 100.0, true, 0)
        .exam_subject("e1", "eng", 100.0, true, 1)
        .exam_subject("e1", "pe", 50.0, false, 2);
    for (student, math, eng, pe) in [
        ("b", Some(90.0), Some(80.0), Some(40.0)),
        ("a", Some(80.0), Some(90.0), Some(30.0)),
        ("t1", Some(95.0), None, Some(50.0)),
        ("z", None, None, None),
    ] {
        for (subject, raw) in [("math", math), ("eng", eng), ("pe", pe)] {
            match raw {
                Some(v) => seed.score("e1", subject, student, v),
                None => seed.absent("e1", subject, student),
            };
        }
    }
    sidecar
}

fn ids(list: &Value, key: &str) -> Vec<String> {
    list.as_array()
        .expect("array")
        .iter()
        .filter_map(|v| v[key].as_str().map(|s| s.to_string()))
        .collect()
}

#[test]
fn total_and_subject_rankings() {
    let mut sidecar = seeded();

    let total = sidecar.request_ok("analytics.ranking.total", json!({ "examId": "e1" }));
    assert_eq!(total["populationSize"], 4);
    assert_eq!(total["rankedCount"], 3);
    assert!(total["topN"].is_null());
    assert_eq!(ids(&total["entries"], "studentId"), vec!["b", "a", "t1"]);
    let ranks: Vec<i64> = total["entries"]
        .as_array()
        .expect("entries")
        .iter()
        .filter_map(|e| e["rank"].as_i64())
        .collect();
    assert_eq!(ranks, vec![1, 2, 3]);

    let top = sidecar.request_ok("analytics.ranking.total", json!({ "examId": "e1", "topN": 2 }));
    assert_eq!(ids(&top["entries"], "studentId"), vec!["b", "a"]);
    assert_eq!(top["rankedCount"], 3);
    assert_eq!(
        sidecar.request_err("analytics.ranking.total", json!({ "examId": "e1", "topN": 0 })),
        "bad_params"
    );

    let c2 = sidecar.request_ok(
        "analytics.ranking.total",
        json!({ "examId": "e1", "classId": "c2" }),
    );
    assert_eq!(ids(&c2["entries"], "studentId"), vec!["t1"]);
    assert_eq!(
        sidecar.request_err(
            "analytics.ranking.total",
            json!({ "examId": "e1", "classId": "c9" })
        ),
        "not_found"
    );

    let math = sidecar.request_ok(
        "analytics.ranking.subject",
        json!({ "examId": "e1", "subjectId": "math" }),
    );
    assert_eq!(ids(&math["entries"], "studentId"), vec!["t1", "b", "a"]);
    let eng = sidecar.request_ok(
        "analytics.ranking.subject",
        json!({ "examId": "e1", "subjectId": "eng" }),
    );
    assert_eq!(ids(&eng["entries"], "studentId"), vec!["a", "b"]);
    // Subjects outside the total still rank on their own.
    let pe = sidecar.request_ok(
        "analytics.ranking.subject",
        json!({ "examId": "e1", "subjectId": "pe", "topN": 1 }),
    );
    assert_eq!(ids(&pe["entries"], "studentId"), vec!["t1"]);
    assert_eq!(
        sidecar.request_err(
            "analytics.ranking.subject",
            json!({ "examId": "e1", "subjectId": "bio" })
        ),
        "not_found"
    );
}

#[test]
fn bounded_top_view_uses_configured_default() {
    let mut sidecar = seeded();
    let top = sidecar.request_ok("analytics.ranking.top", json!({ "examId": "e1" }));
    assert_eq!(top["topN"], 10);
    assert_eq!(ids(&top["entries"], "studentId").len(), 3);

    let _ = sidecar.request_ok(
        "setup.update",
        json!({ "section": "analysis", "patch": { "defaultTopN": 1 } }),
    );
    let top = sidecar.request_ok("analytics.ranking.top", json!({ "examId": "e1" }));
    assert_eq!(ids(&top["entries"], "studentId"), vec!["b"]);
    let explicit = sidecar.request_ok("analytics.ranking.top", json!({ "examId": "e1", "topN": 2 }));
    assert_eq!(ids(&explicit["entries"], "studentId"), vec!["b", "a"]);
}

#[test]
fn segment_distributions() {
    let mut sidecar = seeded();

    let total = sidecar.request_ok("analytics.segments", json!({ "examId": "e1" }));
    assert_eq!(total["maxScore"], 200.0);
    assert_eq!(total["thresholds"]["source"], "percentOfMax");
    let d = &total["distribution"];
    assert_eq!(d["excellentCount"], 0);
    assert_eq!(d["goodCount"], 2);
    assert_eq!(d["passCount"], 0);
    assert_eq!(d["failCount"], 1);
    assert_eq!(d["total"], 3);
    assert_eq!(d["percentages"]["good"], 67);
    assert_eq!(d["percentages"]["fail"], 33);

    let math = sidecar.request_ok(
        "analytics.segments",
        json!({ "examId": "e1", "subjectId": "math" }),
    );
    let d = &math["distribution"];
    assert_eq!(d["excellentCount"], 2);
    assert_eq!(d["goodCount"], 1);
    assert_eq!(d["total"], 3);
}

#[test]
fn overview_subject_stats_and_class_compare() {
    let mut sidecar = seeded();

    let overview = sidecar.request_ok("analytics.exam.overview", json!({ "examId": "e1" }));
    assert_eq!(overview["recordsExamined"], 12);
    assert_eq!(overview["absentRecordCount"], 4);
    assert_eq!(overview["populationSize"], 4);
    assert_eq!(overview["rankedStudentCount"], 3);
    assert_eq!(overview["totalMaxScore"], 200.0);
    assert_eq!(overview["totalStats"]["mean"], 145.0);
    assert_eq!(overview["totalStats"]["median"], 170.0);
    assert_eq!(overview["totalStats"]["max"], 170.0);
    assert_eq!(overview["totalStats"]["min"], 95.0);
    assert!(overview["generatedAt"].is_string());

    let stats = sidecar.request_ok("analytics.subjects.stats", json!({ "examId": "e1" }));
    let subjects = stats["subjects"].as_array().expect("subjects");
    assert_eq!(ids(&stats["subjects"], "subjectId"), vec!["math", "eng", "pe"]);
    let eng = &subjects[1];
    assert_eq!(eng["subjectName"], "English");
    assert_eq!(eng["recordCount"], 4);
    assert_eq!(eng["absentCount"], 2);
    assert_eq!(eng["stats"]["count"], 2);
    assert_eq!(eng["stats"]["mean"], 85.0);
    assert_eq!(eng["excellentRate"], 50);
    assert_eq!(eng["passRate"], 100);
    assert_eq!(eng["lowRate"], 0);
    assert_eq!(subjects[2]["includeInTotal"], false);

    let classes = sidecar.request_ok("analytics.classes.compare", json!({ "examId": "e1" }));
    let list = classes["classes"].as_array().expect("classes");
    assert_eq!(ids(&classes["classes"], "classId"), vec!["c1", "c2"]);
    assert_eq!(list[0]["studentCount"], 2);
    assert_eq!(list[0]["average"], 170.0);
    assert_eq!(list[0]["stdDev"], 0.0);
    assert_eq!(list[1]["studentCount"], 1);
    assert_eq!(list[1]["average"], 95.0);
}

#[test]
fn subject_balance() {
    let mut sidecar = seeded();

    let result = sidecar.request_ok("analytics.balance", json!({ "examId": "e1" }));
    assert_eq!(result["threshold"], 20.0);
    assert_eq!(result["imbalancedCount"], 2);
    let students = result["students"].as_array().expect("students");
    assert_eq!(ids(&result["students"], "studentId"), vec!["a", "b", "t1"]);

    let a = &students[0];
    assert_eq!(a["maxPercentileDiff"], 50);
    assert_eq!(a["averagePercentile"], 17);
    assert_eq!(ids(&a["imbalancedSubjects"]["weak"], "subjectId"), vec!["math", "pe"]);
    assert_eq!(ids(&a["imbalancedSubjects"]["strong"], "subjectId"), vec!["eng"]);

    let b = &students[1];
    assert_eq!(b["maxPercentileDiff"], 33);
    assert_eq!(ids(&b["imbalancedSubjects"]["weak"], "subjectId"), vec!["eng"]);

    let t1 = &students[2];
    assert_eq!(t1["maxPercentileDiff"], 0);
    assert_eq!(t1["isImbalanced"], false);
    assert!(t1["imbalancedSubjects"]["weak"].as_array().expect("weak").is_empty());

    let strict = sidecar.request_ok(
        "analytics.balance",
        json!({ "examId": "e1", "threshold": 40 }),
    );
    assert_eq!(strict["imbalancedCount"], 1);
    assert_eq!(
        sidecar.request_err("analytics.balance", json!({ "examId": "e1", "threshold": -5 })),
        "bad_params"
    );
}
