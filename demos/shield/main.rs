//! Shield mesh demo.
//!
//! Builds a flat shield on a planar carrier surface, solves the triple
//! points, emits the mesh into a [`MeshStore`] and prints a summary.
//!
//! ```text
//! cargo run --example shield
//! RUST_LOG=shieldmesh=debug cargo run --example shield
//! ```

use shieldmesh::geometry::{Plane, TrackSurface};
use shieldmesh::math::{Point2, Point3, Vector3};
use shieldmesh::mesh::MeshStore;
use shieldmesh::shield::GridPoint;
use shieldmesh::{Result, ShieldCounts, ShieldMesh, Side};

const ELEMENT_SIZE: f64 = 0.5;

fn main() -> Result<()> {
    // Default: WARN for everything, INFO for shieldmesh.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("shieldmesh=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let counts = ShieldCounts::new(6, 9, 2)?;
    #[allow(clippy::cast_precision_loss)]
    let (width, height) = (
        counts.elements_count_across() as f64 * ELEMENT_SIZE,
        counts.elements_count_up() as f64 * ELEMENT_SIZE,
    );
    let carrier = Plane::new(
        Point3::origin(),
        Vector3::new(width, 0.0, 0.0),
        Vector3::new(0.0, height, 0.0),
    )?;
    let mut shield = ShieldMesh::new(counts).with_track_surface(TrackSurface::new(carrier)?);

    let triple_row = counts.elements_count_rim() + 1;
    let triple_columns = [Side::Left.column(&counts, 1), Side::Right.column(&counts, 1)];
    let d1 = Vector3::new(ELEMENT_SIZE, 0.0, 0.0);
    let d2 = Vector3::new(0.0, ELEMENT_SIZE, 0.0);
    let d3 = Vector3::new(0.0, 0.0, ELEMENT_SIZE);
    for n2 in 0..=counts.elements_count_up() {
        for n1 in 0..=counts.elements_count_across() {
            if !shield.is_in_footprint(n2, n1)
                || (n2 == triple_row && triple_columns.contains(&n1))
            {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let (x, y) = (n1 as f64 * ELEMENT_SIZE, n2 as f64 * ELEMENT_SIZE);
            let point = GridPoint::new(Point3::new(x, y, 0.0), d1, d2).with_d3(d3);
            shield.set_point(0, n2, n1, point)?;
            shield.set_proportion(n2, n1, Point2::new(x / width, y / height))?;
        }
    }
    shield.solve_triple_points(0)?;

    // Extrude the surface layer along d3.
    for n2 in 0..=counts.elements_count_up() {
        for n1 in 0..=counts.elements_count_across() {
            if let Some(point) = shield.point(0, n2, n1)?.cloned() {
                let offset = point.d3.unwrap_or(d3).normalize() * ELEMENT_SIZE;
                let extruded = GridPoint {
                    position: point.position + offset,
                    ..point
                };
                shield.set_point(1, n2, n1, extruded)?;
            }
        }
    }
    shield.check_footprint()?;

    let mut store = MeshStore::new();
    let next_node = shield.generate_nodes(&mut store, 1)?;
    let next_element = shield.generate_elements(&mut store, 1, &["shield"])?;

    println!(
        "counts: up {}, across {}, rim {}",
        counts.elements_count_up(),
        counts.elements_count_across(),
        counts.elements_count_rim()
    );
    for side in Side::BOTH {
        if let Some(point) = shield.point(0, triple_row, side.column(&counts, 1))? {
            let p = point.position;
            println!("{side:?} triple point: ({:.4}, {:.4}, {:.4})", p.x, p.y, p.z);
        }
    }
    println!("nodes: {} (next {next_node})", store.node_count());
    println!("elements: {} (next {next_element})", store.element_count());
    let remapped = store.elements().filter(|e| !e.has_default_basis()).count();
    println!("elements with remapped basis: {remapped}");
    println!("unresolved elements: {:?}", shield.unresolved_elements());
    Ok(())
}
