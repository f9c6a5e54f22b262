//! Properties of the strict overlap predicate and the evaluator built on it.

use couch_nagger::{evaluate, BoundingBox, ClassId, Confidences, Detection};

fn bb(v: [f32; 4]) -> BoundingBox {
    BoundingBox::try_from(v).expect("valid box")
}

fn overlap(a: [f32; 4], b: [f32; 4]) -> bool {
    bb(a).overlaps(&bb(b))
}

/// Boxes on a small grid, including shared edges, corners and containment.
fn grid() -> Vec<BoundingBox> {
    let coords = [0.0, 25.0, 50.0, 75.0, 100.0];
    let mut boxes = Vec::new();
    for &x1 in &coords {
        for &x2 in &coords {
            for &y1 in &coords {
                for &y2 in &coords {
                    if let Ok(b) = BoundingBox::new(x1, y1, x2, y2) {
                        boxes.push(b);
                    }
                }
            }
        }
    }
    boxes
}

#[test]
fn overlap_is_symmetric() {
    let boxes = grid();
    for a in &boxes {
        for b in &boxes {
            assert_eq!(a.overlaps(b), b.overlaps(a), "{:?} vs {:?}", a, b);
        }
    }
}

#[test]
fn overlap_matches_positive_intersection_area() {
    let boxes = grid();
    for a in &boxes {
        for b in &boxes {
            assert_eq!(a.overlaps(b), a.intersection_area(b) > 0.0);
        }
    }
}

#[test]
fn reference_cases() {
    assert!(overlap([0.0, 0.0, 100.0, 100.0], [25.0, 25.0, 75.0, 75.0]));
    assert!(!overlap([0.0, 0.0, 50.0, 50.0], [100.0, 100.0, 150.0, 150.0]));
    assert!(overlap([0.0, 0.0, 100.0, 100.0], [50.0, 50.0, 150.0, 150.0]));
    assert!(!overlap([0.0, 0.0, 50.0, 50.0], [50.0, 50.0, 100.0, 100.0]));
}

#[test]
fn couch_only_reports_zero_dog_confidence() {
    let couch = Detection::new(ClassId::COUCH, 0.6, bb([0.0, 0.0, 200.0, 100.0]));
    let verdict = evaluate(&[couch]);
    assert!(!verdict.dog_on_couch);
    assert_eq!(verdict.confidence, Confidences { dog: 0.0, couch: 0.6 });
}

#[test]
fn dog_on_couch_requires_both_classes_and_overlap() {
    let boxes = grid();
    for dog_box in boxes.iter().step_by(7) {
        for couch_box in boxes.iter().step_by(11) {
            let verdict = evaluate(&[
                Detection::new(ClassId::DOG, 0.8, *dog_box),
                Detection::new(ClassId::COUCH, 0.7, *couch_box),
            ]);
            assert_eq!(verdict.dog_on_couch, dog_box.overlaps(couch_box));
            if verdict.dog_on_couch {
                assert!(verdict.confidence.dog > 0.0 && verdict.confidence.couch > 0.0);
            }
        }
        let alone = evaluate(&[Detection::new(ClassId::DOG, 0.8, *dog_box)]);
        assert!(!alone.dog_on_couch);
    }
}
