//! Demo showing path kernels over vector and label sequences

use pathkernel::api::PathKernelBuilder;
use pathkernel::utils::bandwidth::select_sigma;
use pathkernel::utils::{distance, validation};
use pathkernel::{Kernel, NormalizedKernel, PathKernel, RbfKernel, SymbolKernel};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn print_matrix(name: &str, matrix: &[Vec<f64>]) {
    println!("{name}:");
    for row in matrix {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:8.4}")).collect();
        println!("  {}", cells.join(" "));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Path Kernel Demo ===");

    // Three short trajectories in the plane
    let trajectories = vec![
        vec![vec![0.0, 0.0], vec![0.5, 0.1], vec![1.0, 0.2], vec![1.5, 0.2]],
        vec![vec![0.0, 0.1], vec![0.6, 0.1], vec![1.4, 0.3]],
        vec![vec![0.0, 0.0], vec![0.0, 0.7], vec![0.1, 1.5]],
    ];

    let mut rng = StdRng::seed_from_u64(2024);
    let sigma = select_sigma(&trajectories, None, &mut rng)?;
    println!("\nSuggested RBF sigma: {sigma:.4}");
    let sigma = if sigma > 0.0 { sigma } else { 1.0 };

    println!("\n--- RBF ground kernel ---");
    let mut path = PathKernelBuilder::new().build(RbfKernel::new(sigma)?)?;
    let gram = path.self_matrix(&trajectories)?;
    print_matrix("Gram matrix", &gram);
    println!("Weight matrix dimension: {}", path.dimension());

    let mut normalized = NormalizedKernel::new(&mut path);
    let gram = normalized.compute_gram(&trajectories)?;
    print_matrix("Normalized Gram matrix", &gram);

    let distances = distance::distance_gram(&mut normalized, &trajectories)?;
    print_matrix("Kernel distances", &distances);
    println!(
        "Triangle inequality holds: {}",
        validation::respects_triangle_inequality(&distances)
    );

    println!("\n--- Label ground kernel ---");
    // Labels 0 and 1 are similar, 2 is different from both
    let similarity = SymbolKernel::new(vec![
        vec![1.0, 0.8, 0.0],
        vec![0.8, 1.0, 0.1],
        vec![0.0, 0.1, 1.0],
    ])?;
    let words = vec![vec![0usize, 0, 1, 2], vec![1, 1, 0, 2], vec![2, 2, 2]];
    let mut path = PathKernel::with_step_costs(similarity, 0.3, 0.4)?;
    let gram = path.self_matrix(&words)?;
    print_matrix("Gram matrix", &gram);
    println!("Symmetric: {}", validation::is_symmetric(&gram));

    let stats = path.weight_stats();
    println!(
        "Weight matrix grew {} times, {} cells computed",
        stats.extensions, stats.cells_computed
    );

    Ok(())
}
