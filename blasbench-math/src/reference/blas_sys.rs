extern crate blas_src;
extern crate blas_sys;

use std::{os::raw::c_char, ptr::addr_of};

use num_complex::{Complex32, Complex64};

use super::Reference;
use crate::layout::{Diag, Side, Transpose, Uplo};

// Slice lengths are checked by the dispatch layer before a reference call is made, so the
// pointers below always cover what the Fortran routine reads.
macro_rules! impl_reference {
    ($elem:ty =>
        syr: $syr:path,
        spr: $spr:path,
        spmv: $spmv:path,
        trsm: $trsm:path,
    ) => {
        impl Reference for $elem {
            fn syr(
                uplo: Uplo,
                n: usize,
                alpha: Self::Real,
                x: &[Self],
                incx: isize,
                a: &mut [Self],
                lda: usize,
            ) {
                unsafe {
                    $syr(
                        &(uplo as u8 as c_char),
                        &(n as i32),
                        addr_of!(alpha).cast(),
                        x.as_ptr().cast(),
                        &(incx as i32),
                        a.as_mut_ptr().cast(),
                        &(lda as i32),
                    );
                }
            }

            fn spr(
                uplo: Uplo,
                n: usize,
                alpha: Self::Real,
                x: &[Self],
                incx: isize,
                ap: &mut [Self],
            ) {
                unsafe {
                    $spr(
                        &(uplo as u8 as c_char),
                        &(n as i32),
                        addr_of!(alpha).cast(),
                        x.as_ptr().cast(),
                        &(incx as i32),
                        ap.as_mut_ptr().cast(),
                    );
                }
            }

            fn spmv(
                uplo: Uplo,
                n: usize,
                alpha: Self,
                ap: &[Self],
                x: &[Self],
                incx: isize,
                beta: Self,
                y: &mut [Self],
                incy: isize,
            ) {
                unsafe {
                    $spmv(
                        &(uplo as u8 as c_char),
                        &(n as i32),
                        addr_of!(alpha).cast(),
                        ap.as_ptr().cast(),
                        x.as_ptr().cast(),
                        &(incx as i32),
                        addr_of!(beta).cast(),
                        y.as_mut_ptr().cast(),
                        &(incy as i32),
                    );
                }
            }

            fn trsm(
                side: Side,
                uplo: Uplo,
                trans: Transpose,
                diag: Diag,
                m: usize,
                n: usize,
                alpha: Self,
                a: &[Self],
                lda: usize,
                b: &mut [Self],
                ldb: usize,
            ) {
                unsafe {
                    $trsm(
                        &(side as u8 as c_char),
                        &(uplo as u8 as c_char),
                        &(trans as u8 as c_char),
                        &(diag as u8 as c_char),
                        &(m as i32),
                        &(n as i32),
                        addr_of!(alpha).cast(),
                        a.as_ptr().cast(),
                        &(lda.max(1) as i32),
                        b.as_mut_ptr().cast(),
                        &(ldb.max(1) as i32),
                    );
                }
            }
        }
    };
}

impl_reference!(f32 =>
    syr: blas_sys::ssyr_,
    spr: blas_sys::sspr_,
    spmv: blas_sys::sspmv_,
    trsm: blas_sys::strsm_,
);

impl_reference!(f64 =>
    syr: blas_sys::dsyr_,
    spr: blas_sys::dspr_,
    spmv: blas_sys::dspmv_,
    trsm: blas_sys::dtrsm_,
);

impl_reference!(Complex32 =>
    syr: blas_sys::cher_,
    spr: blas_sys::chpr_,
    spmv: blas_sys::chpmv_,
    trsm: blas_sys::ctrsm_,
);

impl_reference!(Complex64 =>
    syr: blas_sys::zher_,
    spr: blas_sys::zhpr_,
    spmv: blas_sys::zhpmv_,
    trsm: blas_sys::ztrsm_,
);
