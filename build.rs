use vergen_gitcl::{Cargo, Emitter, Gitcl};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let mut emitter = Emitter::default();
	emitter.fail_on_error();

	emitter.add_instructions(&Cargo::builder().target_triple(true).build())?;

	// Builds from a source tarball have no git metadata.
	if emitter.add_instructions(&Gitcl::builder().sha(true).build()).is_err() {
		println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown");
	}

	emitter.emit()?;

	Ok(())
}
