use criterion::{black_box, criterion_group, criterion_main, Criterion};
use indexmap::IndexMap;
use substdist::alignment::seq_index::AlignedTree;
use substdist::alignment::sufficient_stats::SufficientStats;
use substdist::model::get_model::{hky85, HKY85Params};
use substdist::subst::alignment_distrib::{posterior_distrib_alignment, posterior_distrib_sites};
use substdist::subst::branch::BranchDistribs;
use substdist::subst::jump_process::JumpProcess;
use substdist::subst::tree_dp::posterior_distrib_site_with;
use substdist::tree::tree::{Tree, TreeSpec};

const NUCS: [char; 4] = ['A', 'C', 'G', 'T'];

/// Caterpillar tree with `n` leaves named `s0`, `s1`, ...
fn caterpillar(n: usize) -> TreeSpec {
  let mut spec = TreeSpec::leaf("s0", 0.05);
  for i in 1..n {
    let leaf = TreeSpec::leaf(format!("s{i}"), 0.01 * (1 + i % 7) as f64);
    spec = TreeSpec::internal(None, 0.02, spec, leaf);
  }
  spec
}

/// Deterministic alignment where sequences diverge progressively from the first one
fn alignment(nseqs: usize, nsites: usize) -> IndexMap<String, String> {
  (0..nseqs)
    .map(|i| {
      let seq: String = (0..nsites)
        .map(|j| {
          if (i * 31 + j * 17) % 11 < i % 4 {
            NUCS[(j + i) % 4]
          } else {
            NUCS[j % 4]
          }
        })
        .collect();
      (format!("s{i}"), seq)
    })
    .collect()
}

fn benchmark_main(c: &mut Criterion) {
  let nseqs = 32;
  let tree = Tree::from_spec(&caterpillar(nseqs)).unwrap();
  let stats = SufficientStats::from_map(&alignment(nseqs, 300)).unwrap();
  let model = hky85(HKY85Params::default()).unwrap();
  let jp = JumpProcess::for_tree(&model, &tree).unwrap();
  let aligned = AlignedTree::new(tree, stats, model.alphabet().clone()).unwrap();
  let branches = BranchDistribs::new(&jp, aligned.tree()).unwrap();

  let mut g = c.benchmark_group("subst_distrib");

  g.bench_function("posterior_distrib_site", |b| {
    b.iter(|| posterior_distrib_site_with(black_box(&jp), black_box(&aligned), black_box(&branches), 0));
  });

  g.bench_function("posterior_distrib_sites", |b| {
    b.iter(|| posterior_distrib_sites(black_box(&jp), black_box(&aligned)));
  });

  g.bench_function("posterior_distrib_alignment", |b| {
    b.iter(|| posterior_distrib_alignment(black_box(&jp), black_box(&aligned)));
  });

  g.finish();
}

criterion_group!(subst_distrib, benchmark_main);
criterion_main!(subst_distrib);
