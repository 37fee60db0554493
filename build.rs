use std::env;

fn main() {
    println!("cargo:rerun-if-changed=src/arch/riscv/trampoline.S");
    println!("cargo:rerun-if-changed=src/arch/riscv/kernelvec.S");
    println!("cargo:rustc-check-cfg=cfg(kernel_target)");

    let target = env::var("TARGET").expect("TARGET is set by cargo");

    // Hosted builds (the test crate) get the portable trap logic only; the
    // trap vectors are assembled for the bare-metal RISC-V kernel target.
    if target.starts_with("riscv64") && target.ends_with("-none-elf") {
        println!("cargo:rustc-cfg=kernel_target");

        cc::Build::new()
            .file("src/arch/riscv/trampoline.S")
            .file("src/arch/riscv/kernelvec.S")
            .flag_if_supported("-march=rv64gc")
            .flag_if_supported("-mabi=lp64d")
            .flag_if_supported("-fno-asynchronous-unwind-tables")
            .compile("trapvec");
    }
}
