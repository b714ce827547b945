use thinktank_wrapper::{cli, run};

fn main() {
    let args = cli::get_args();
    std::process::exit(run::run(args));
}
